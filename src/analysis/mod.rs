//! Analysis modules.
//!
//! Pure computations over in-memory record sets: field normalization,
//! aggregation, filtering, chart data and table helpers.

pub mod aggregator;
pub mod charts;
pub mod filter;
pub mod normalizer;
pub mod table;

pub use aggregator::*;
pub use filter::filter_records;
