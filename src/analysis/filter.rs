//! Record filtering.
//!
//! Region and task constraints compare against the normalized values, so
//! filtering on `"Unspecified"` selects records with no region. Free-text
//! search is a case-insensitive substring match over one column or all of
//! them. All supplied constraints are AND-ed.

use crate::analysis::normalizer::{lookup, region_of, task_of};
use crate::models::{FilterState, Record};

/// Returns the records matching `state`, in their original order.
pub fn filter_records(records: &[Record], state: &FilterState) -> Vec<Record> {
    if state.is_empty() {
        return records.to_vec();
    }

    let matcher = Matcher::new(state);
    records
        .iter()
        .filter(|record| matcher.matches(record))
        .cloned()
        .collect()
}

/// Filter constraints with the comparison strings lowercased once up front.
struct Matcher<'a> {
    region: Option<String>,
    task: Option<String>,
    search: Option<String>,
    column: Option<&'a str>,
}

impl<'a> Matcher<'a> {
    fn new(state: &'a FilterState) -> Self {
        Self {
            region: state.region().map(str::to_lowercase),
            task: state.task().map(str::to_lowercase),
            search: state.search().map(str::to_lowercase),
            column: state.column(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        if let Some(ref region) = self.region {
            if region_of(record).to_lowercase() != *region {
                return false;
            }
        }

        if let Some(ref task) = self.task {
            if task_of(record).to_lowercase() != *task {
                return false;
            }
        }

        match self.search {
            Some(ref needle) => self.search_matches(record, needle),
            None => true,
        }
    }

    fn search_matches(&self, record: &Record, needle: &str) -> bool {
        match self.column {
            Some(column) => {
                let haystack = lookup(record, column)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                haystack.to_lowercase().contains(needle)
            }
            None => record
                .values()
                .any(|value| value.to_string().to_lowercase().contains(needle)),
        }
    }
}
