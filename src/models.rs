//! Data models for the spreadsheet pipeline.
//!
//! This module contains the core data structures used throughout
//! the application: imported records, filter state, and the derived
//! region/task summaries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when a record carries no usable region or task value.
pub const UNSPECIFIED: &str = "Unspecified";

/// A single scalar cell value as imported from a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text cell
    Text(String),
    /// Numeric cell (integers are stored as floats, like the source format)
    Number(f64),
    /// Boolean cell
    Bool(bool),
    /// Empty cell
    #[default]
    Empty,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Empty => Ok(()),
        }
    }
}

impl Value {
    /// Returns true if the value stringifies to nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Text(s) => s.trim().is_empty(),
            Value::Empty => true,
            Value::Number(_) | Value::Bool(_) => false,
        }
    }

    /// Returns the numeric value if this cell is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One imported row: column name (case as supplied) to cell value.
///
/// Column order follows the source sheet. Fields whose cells were empty
/// are absent rather than stored as [`Value::Empty`].
pub type Record = IndexMap<String, Value>;

/// Active filter constraints. `None` or a blank string means
/// "no constraint on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Region to match (case-insensitive, exact).
    pub region_filter: Option<String>,
    /// Task to match (case-insensitive, exact).
    pub task_filter: Option<String>,
    /// Free text to search for (case-insensitive substring).
    pub search_text: Option<String>,
    /// Column to restrict the free-text search to.
    pub search_column: Option<String>,
}

impl FilterState {
    /// Creates an empty filter state (every record passes).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_filter = Some(region.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task_filter = Some(task.into());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>, column: Option<String>) -> Self {
        self.search_text = Some(text.into());
        self.search_column = column;
        self
    }

    /// The region constraint, if one is set.
    pub fn region(&self) -> Option<&str> {
        active(&self.region_filter)
    }

    /// The task constraint, if one is set.
    pub fn task(&self) -> Option<&str> {
        active(&self.task_filter)
    }

    /// The free-text constraint, if one is set.
    pub fn search(&self) -> Option<&str> {
        active(&self.search_text)
    }

    /// The search column, if one is set.
    pub fn column(&self) -> Option<&str> {
        active(&self.search_column)
    }

    /// Returns true if no dimension is constrained.
    pub fn is_empty(&self) -> bool {
        self.region().is_none() && self.task().is_none() && self.search().is_none()
    }
}

/// Whitespace only decides whether a constraint is set; the value itself
/// is compared as given.
fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Label used for records with no status value.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Coarse progress class derived from a record's status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Completed,
    Pending,
    Urgent,
}

impl StatusClass {
    /// "complete" anywhere in the text wins, then "urgent"; anything else,
    /// including a missing status, is pending.
    pub fn classify(status: Option<&str>) -> Self {
        let status = status.map(str::to_lowercase).unwrap_or_default();
        if status.contains("complete") {
            StatusClass::Completed
        } else if status.contains("urgent") {
            StatusClass::Urgent
        } else {
            StatusClass::Pending
        }
    }
}

/// Completed / pending / urgent counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: usize,
    pub pending: usize,
    pub urgent: usize,
}

impl StatusCounts {
    pub fn add(&mut self, class: StatusClass) {
        match class {
            StatusClass::Completed => self.completed += 1,
            StatusClass::Pending => self.pending += 1,
            StatusClass::Urgent => self.urgent += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.pending + self.urgent
    }

    /// Completed records as a percentage of all records (0 when empty).
    pub fn completion_rate(&self) -> f64 {
        percent(self.completed, self.total())
    }
}

/// `count` as a percentage of `total` (0 when `total` is 0).
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Record counts for one region, broken down by task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Region label.
    pub region: String,
    /// Number of records attributed to this region.
    pub total_count: usize,
    /// Per-task counts in first-seen order.
    pub task_counts: IndexMap<String, usize>,
    /// Progress breakdown from the status column.
    #[serde(default)]
    pub status: StatusCounts,
}

impl RegionSummary {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            total_count: 0,
            task_counts: IndexMap::new(),
            status: StatusCounts::default(),
        }
    }
}

/// Record count for one task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task label.
    pub task: String,
    /// Number of records carrying this task.
    pub total_count: usize,
    /// Raw status values seen for this task, with counts.
    #[serde(default)]
    pub statuses: IndexMap<String, usize>,
}

impl TaskSummary {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            total_count: 0,
            statuses: IndexMap::new(),
        }
    }
}

/// The derived tables for one record set.
///
/// Both lists are in first-seen order of their keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summaries {
    /// Region totals with the region×task crosstab.
    pub regions: Vec<RegionSummary>,
    /// Task totals.
    pub tasks: Vec<TaskSummary>,
}

impl Summaries {
    /// Returns true if no records contributed.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.tasks.is_empty()
    }

    /// Total number of records counted.
    #[cfg(test)]
    pub fn total_records(&self) -> usize {
        self.regions.iter().map(|r| r.total_count).sum()
    }

    /// Looks up a region summary by exact label.
    pub fn region(&self, region: &str) -> Option<&RegionSummary> {
        self.regions.iter().find(|r| r.region == region)
    }

    /// Looks up a task summary by exact label.
    #[cfg(test)]
    pub fn task(&self, task: &str) -> Option<&TaskSummary> {
        self.tasks.iter().find(|t| t.task == task)
    }

    /// Crosstab cell: records with this region and task (0 when absent).
    pub fn count(&self, region: &str, task: &str) -> usize {
        self.region(region)
            .and_then(|r| r.task_counts.get(task).copied())
            .unwrap_or(0)
    }

    /// Distinct region labels in first-seen order.
    pub fn distinct_regions(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.region.as_str()).collect()
    }

    /// Distinct task labels in first-seen order.
    pub fn distinct_tasks(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task.as_str()).collect()
    }
}

/// Headline numbers shown above the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCards {
    /// Number of records in the current view.
    pub total_records: usize,
    /// Number of distinct regions.
    pub regions: usize,
    /// Number of distinct task types.
    pub task_types: usize,
    /// Region with the most records (first-seen wins ties).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busiest_region: Option<String>,
    /// Most frequent task (first-seen wins ties).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_task: Option<String>,
    /// Records whose status reads as completed.
    pub completed: usize,
}

impl SummaryCards {
    /// Derives the cards from a record count and its summaries.
    pub fn from_summaries(total_records: usize, summaries: &Summaries) -> Self {
        let busiest_region = summaries
            .regions
            .iter()
            .fold(None::<&RegionSummary>, |best, r| match best {
                Some(b) if b.total_count >= r.total_count => Some(b),
                _ => Some(r),
            })
            .map(|r| r.region.clone());

        let top_task = summaries
            .tasks
            .iter()
            .fold(None::<&TaskSummary>, |best, t| match best {
                Some(b) if b.total_count >= t.total_count => Some(b),
                _ => Some(t),
            })
            .map(|t| t.task.clone());

        Self {
            total_records,
            regions: summaries.regions.len(),
            task_types: summaries.tasks.len(),
            busiest_region,
            top_task,
            completed: summaries.regions.iter().map(|r| r.status.completed).sum(),
        }
    }
}

/// Builds a record from `(column, value)` pairs.
#[cfg(test)]
pub fn record<'a, I, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

/// Record generators shared by the property tests.
#[cfg(test)]
pub mod strategies {
    use super::{Record, Value};
    use proptest::prelude::*;

    /// Column names, including case variants of the grouping keys.
    const KEYS: [&str; 10] = [
        "Region",
        "REGION",
        "region",
        "Task",
        "task",
        "Task Assignment",
        "Status",
        "STATUS",
        "Notes",
        "Qty",
    ];

    const TEXTS: [&str; 11] = [
        "East", "west", " East ", "", "   ", "Install", "REPAIR", "Completed", "urgent", "open",
        "东区",
    ];

    /// Any cell except `Value::Empty`.
    pub fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            4 => prop::sample::select(TEXTS.to_vec()).prop_map(Value::from),
            2 => (-1000i32..1000).prop_map(|n| Value::Number(f64::from(n) / 4.0)),
            1 => any::<bool>().prop_map(Value::Bool),
        ]
    }

    /// A record with 0 to 6 columns drawn from a small key pool.
    pub fn record_strategy() -> impl Strategy<Value = Record> {
        prop::collection::vec(
            (prop::sample::select(KEYS.to_vec()), value_strategy()),
            0..6,
        )
        .prop_map(|fields| {
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect()
        })
    }

    pub fn records_strategy() -> impl Strategy<Value = Vec<Record>> {
        prop::collection::vec(record_strategy(), 0..40)
    }

    /// Filter values: real labels, other case, padding, or nothing useful.
    pub fn filter_value_strategy() -> impl Strategy<Value = Option<String>> {
        prop::option::of(
            prop::sample::select(vec!["east", "East", " East ", "install", "Unspecified", "2", "  "])
                .prop_map(String::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("East").to_string(), "East");
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn test_value_is_blank() {
        assert!(Value::Empty.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(!Value::from("x").is_blank());
        assert!(!Value::Number(0.0).is_blank());
    }

    #[test]
    fn test_value_json_untagged() {
        let rec = record([("Region", Value::from("East")), ("Qty", Value::Number(3.0))]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"Region":"East","Qty":3.0}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_filter_state_blank_is_inactive() {
        let state = FilterState::new().with_region("  ").with_task("");
        assert!(state.is_empty());
        assert_eq!(state.region(), None);

        let state = FilterState::new().with_region(" east ");
        assert!(!state.is_empty());
        assert_eq!(state.region(), Some(" east "));
    }

    #[test]
    fn test_summaries_count() {
        let mut east = RegionSummary::new("East");
        east.total_count = 2;
        east.task_counts.insert("Install".to_string(), 2);

        let summaries = Summaries {
            regions: vec![east],
            tasks: vec![TaskSummary {
                total_count: 2,
                ..TaskSummary::new("Install")
            }],
        };

        assert_eq!(summaries.count("East", "Install"), 2);
        assert_eq!(summaries.count("East", "Repair"), 0);
        assert_eq!(summaries.count("West", "Install"), 0);
        assert_eq!(summaries.total_records(), 2);
    }

    #[test]
    fn test_summary_cards_ties_keep_first_seen() {
        let mut a = RegionSummary::new("North");
        a.total_count = 3;
        a.status.completed = 2;
        let mut b = RegionSummary::new("South");
        b.total_count = 3;
        b.status.completed = 1;
        let summaries = Summaries {
            regions: vec![a, b],
            tasks: vec![
                TaskSummary {
                    total_count: 1,
                    ..TaskSummary::new("Survey")
                },
                TaskSummary {
                    total_count: 5,
                    ..TaskSummary::new("Repair")
                },
            ],
        };

        let cards = SummaryCards::from_summaries(6, &summaries);
        assert_eq!(cards.regions, 2);
        assert_eq!(cards.task_types, 2);
        assert_eq!(cards.busiest_region.as_deref(), Some("North"));
        assert_eq!(cards.top_task.as_deref(), Some("Repair"));
        assert_eq!(cards.completed, 3);
    }

    #[test]
    fn test_status_classify() {
        assert_eq!(StatusClass::classify(Some("Completed")), StatusClass::Completed);
        assert_eq!(StatusClass::classify(Some("INCOMPLETE")), StatusClass::Completed);
        assert_eq!(StatusClass::classify(Some("Urgent - leak")), StatusClass::Urgent);
        assert_eq!(StatusClass::classify(Some("In progress")), StatusClass::Pending);
        assert_eq!(StatusClass::classify(None), StatusClass::Pending);
    }

    #[test]
    fn test_status_counts() {
        let mut counts = StatusCounts::default();
        assert_eq!(counts.completion_rate(), 0.0);

        counts.add(StatusClass::Completed);
        counts.add(StatusClass::Pending);
        counts.add(StatusClass::Urgent);
        counts.add(StatusClass::Completed);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.completion_rate(), 50.0);
        assert!((percent(1, 3) - 33.333).abs() < 0.001);
        assert_eq!(percent(3, 0), 0.0);
    }
}
