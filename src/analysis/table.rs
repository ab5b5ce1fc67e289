//! Table helpers: column discovery and display sorting.
//!
//! Sorting here only affects how rows are shown; the filtered record set
//! and the export keep the original import order.

use crate::analysis::normalizer::lookup;
use crate::models::{Record, Value};
use indexmap::IndexSet;
use std::cmp::{Ordering, Reverse};

/// Direction for a table sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Union of the record keys, first record's keys first.
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for record in records {
        for key in record.keys() {
            seen.insert(key.as_str());
        }
    }
    seen.into_iter().map(String::from).collect()
}

/// Sort records by one column (matched case-insensitively).
///
/// Finite numbers, and text that parses as one, sort numerically ahead of
/// everything else. The rest compares as text ignoring case, with the
/// exact text breaking ties. Missing values sort as empty text. The sort
/// is stable, so rows with equal keys keep their import order.
pub fn sort_records(records: &mut [Record], column: &str, direction: SortDirection) {
    match direction {
        SortDirection::Ascending => records.sort_by_cached_key(|r| CellKey::of(lookup(r, column))),
        SortDirection::Descending => {
            records.sort_by_cached_key(|r| Reverse(CellKey::of(lookup(r, column))))
        }
    }
}

/// Sort key for one cell.
#[derive(Debug, Clone)]
enum CellKey {
    Number(f64),
    Text { folded: String, raw: String },
}

impl CellKey {
    fn of(value: Option<&Value>) -> Self {
        let raw = value.map(ToString::to_string).unwrap_or_default();
        let number = value
            .and_then(Value::as_number)
            .or_else(|| raw.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite());

        match number {
            Some(n) => CellKey::Number(n),
            None => CellKey::Text {
                folded: raw.to_lowercase(),
                raw,
            },
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Number(a), CellKey::Number(b)) => a.total_cmp(b),
            (CellKey::Number(_), CellKey::Text { .. }) => Ordering::Less,
            (CellKey::Text { .. }, CellKey::Number(_)) => Ordering::Greater,
            (
                CellKey::Text { folded: a, raw: ra },
                CellKey::Text { folded: b, raw: rb },
            ) => a.cmp(b).then_with(|| ra.cmp(rb)),
        }
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}
