//! Report output.
//!
//! Export bundle assembly, xlsx writing, and the Markdown/JSON/terminal
//! renderings of the current view.

pub mod builder;
pub mod generator;
pub mod terminal;
pub mod writer;

pub use builder::{build_report, ExportBundle, ReportOptions};
pub use generator::{generate_json_report, generate_markdown_report, ViewMetadata, ViewReport};
pub use writer::export_to_file;
