//! Region, task and status extraction.
//!
//! Source sheets spell their headers in any case ("REGION", "Region",
//! "region"), so every lookup here is case-insensitive. The same rules
//! are used by the aggregator and the filter so both always agree on
//! which region/task a record belongs to.

use crate::models::{Record, StatusClass, Value, UNKNOWN_STATUS, UNSPECIFIED};

const REGION_KEY: &str = "region";
const TASK_KEYS: [&str; 2] = ["task assignment", "task"];
const STATUS_KEY: &str = "status";

/// Compares two column names ignoring case.
pub fn same_key(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive column lookup. The first matching key wins.
pub fn lookup<'a>(record: &'a Record, column: &str) -> Option<&'a Value> {
    record
        .iter()
        .find(|(key, _)| same_key(key, column))
        .map(|(_, value)| value)
}

/// First non-blank value among keys matching `column`, in column order.
fn first_non_blank(record: &Record, column: &str) -> Option<String> {
    record
        .iter()
        .filter(|(key, _)| same_key(key, column))
        .find(|(_, value)| !value.is_blank())
        .map(|(_, value)| value.to_string())
}

/// The record's region, or `"Unspecified"`.
pub fn region_of(record: &Record) -> String {
    first_non_blank(record, REGION_KEY).unwrap_or_else(|| UNSPECIFIED.to_string())
}

/// The record's task: "Task Assignment" first, then "Task", else `"Unspecified"`.
pub fn task_of(record: &Record) -> String {
    TASK_KEYS
        .iter()
        .find_map(|key| first_non_blank(record, key))
        .unwrap_or_else(|| UNSPECIFIED.to_string())
}

/// The record's raw status text, or `"Unknown"`.
pub fn status_of(record: &Record) -> String {
    first_non_blank(record, STATUS_KEY).unwrap_or_else(|| UNKNOWN_STATUS.to_string())
}

/// Completed / pending / urgent class of the record's status.
pub fn status_class_of(record: &Record) -> StatusClass {
    StatusClass::classify(first_non_blank(record, STATUS_KEY).as_deref())
}
