//! Export bundle assembly.
//!
//! Builds the named tables that make up an exported workbook. The order
//! of the tables is fixed: Summary, Regions, Tasks, Detailed Data, and
//! (when enabled) the region×task crosstab after those four.

use crate::analysis::table::columns;
use crate::error::PipelineError;
use crate::models::{Record, Summaries, Value};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{debug, info};

pub const SUMMARY_SHEET: &str = "Summary";
pub const REGIONS_SHEET: &str = "Regions";
pub const TASKS_SHEET: &str = "Tasks";
pub const DETAILED_SHEET: &str = "Detailed Data";
pub const CROSSTAB_SHEET: &str = "Region x Task";

/// Longest text a single spreadsheet cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Longest allowed sheet name.
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Options controlling report content.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Label written into the Summary table.
    pub label: String,
    /// `chrono` format string for the generation timestamp.
    pub timestamp_format: String,
    /// Append the region×task crosstab table.
    pub include_crosstab: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            label: "Excel Data Analyzer Report".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            include_crosstab: false,
        }
    }
}

impl From<&crate::config::ReportConfig> for ReportOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            label: config.label.clone(),
            timestamp_format: config.timestamp_format.clone(),
            include_crosstab: config.include_crosstab,
        }
    }
}

/// One named table: a list of rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub rows: Vec<Vec<Value>>,
    /// Whether the first row is a header row.
    pub has_header: bool,
}

impl Table {
    fn new(name: &str, has_header: bool) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            has_header,
        }
    }

    fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Rows after the header (all rows for header-less tables).
    pub fn data_rows(&self) -> &[Vec<Value>] {
        if self.has_header && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }

    /// Read the table back into records, using the header row as keys.
    /// Empty cells are left out, matching how records are imported.
    #[cfg(test)]
    pub fn to_records(&self) -> Vec<Record> {
        let Some(header) = self.rows.first().filter(|_| self.has_header) else {
            return Vec::new();
        };
        let keys: Vec<String> = header.iter().map(ToString::to_string).collect();

        self.data_rows()
            .iter()
            .map(|row| {
                keys.iter()
                    .zip(row)
                    .filter(|(_, value)| **value != Value::Empty)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .collect()
    }
}

/// The full set of tables for one export, in sheet order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub generated_at: DateTime<Local>,
    pub tables: Vec<Table>,
}

impl ExportBundle {
    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in sheet order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Build the export bundle for the current view.
///
/// Either every table is built and validated, or an error is returned and
/// nothing is handed back.
pub fn build_report(
    records: &[Record],
    summaries: &Summaries,
    options: &ReportOptions,
) -> Result<ExportBundle, PipelineError> {
    build_report_at(records, summaries, options, Local::now())
}

/// [`build_report`] with an explicit generation time.
pub fn build_report_at(
    records: &[Record],
    summaries: &Summaries,
    options: &ReportOptions,
    generated_at: DateTime<Local>,
) -> Result<ExportBundle, PipelineError> {
    let mut tables = vec![
        summary_table(records, summaries, options, &generated_at)?,
        regions_table(summaries),
        tasks_table(summaries),
        detailed_table(records),
    ];
    if options.include_crosstab {
        tables.push(crosstab_table(summaries));
    }

    for table in &tables {
        validate_table(table)?;
    }

    info!(
        "Built report with {} tables ({} detailed rows)",
        tables.len(),
        records.len()
    );

    Ok(ExportBundle {
        generated_at,
        tables,
    })
}

fn summary_table(
    records: &[Record],
    summaries: &Summaries,
    options: &ReportOptions,
    generated_at: &DateTime<Local>,
) -> Result<Table, PipelineError> {
    let mut timestamp = String::new();
    write!(timestamp, "{}", generated_at.format(&options.timestamp_format)).map_err(|_| {
        PipelineError::Write(format!(
            "invalid timestamp format '{}'",
            options.timestamp_format
        ))
    })?;

    let mut table = Table::new(SUMMARY_SHEET, false);
    table.push(vec!["Report Type".into(), options.label.as_str().into()]);
    table.push(vec!["Generated At".into(), timestamp.into()]);
    table.push(vec!["Total Tasks".into(), records.len().into()]);
    table.push(vec!["Total Regions".into(), summaries.regions.len().into()]);
    Ok(table)
}

fn regions_table(summaries: &Summaries) -> Table {
    let mut table = Table::new(REGIONS_SHEET, true);
    table.push(vec!["Region".into(), "Task Count".into()]);
    for region in &summaries.regions {
        table.push(vec![region.region.as_str().into(), region.total_count.into()]);
    }
    table
}

fn tasks_table(summaries: &Summaries) -> Table {
    let mut table = Table::new(TASKS_SHEET, true);
    table.push(vec!["Task Type".into(), "Count".into()]);
    for task in &summaries.tasks {
        table.push(vec![task.task.as_str().into(), task.total_count.into()]);
    }
    table
}

fn detailed_table(records: &[Record]) -> Table {
    let mut table = Table::new(DETAILED_SHEET, true);
    let keys = columns(records);
    table.push(keys.iter().map(|k| k.as_str().into()).collect());

    for record in records {
        table.push(
            keys.iter()
                .map(|k| record.get(k).cloned().unwrap_or_default())
                .collect(),
        );
    }
    table
}

fn crosstab_table(summaries: &Summaries) -> Table {
    let mut table = Table::new(CROSSTAB_SHEET, true);
    let tasks = summaries.distinct_tasks();

    let mut header: Vec<Value> = vec!["Region".into()];
    header.extend(tasks.iter().map(|t| Value::from(*t)));
    table.push(header);

    for region in &summaries.regions {
        let mut row: Vec<Value> = vec![region.region.as_str().into()];
        row.extend(
            tasks
                .iter()
                .map(|t| Value::from(summaries.count(&region.region, t))),
        );
        table.push(row);
    }
    table
}

/// Check that every cell can be written to a spreadsheet.
fn validate_table(table: &Table) -> Result<(), PipelineError> {
    let name_len = table.name.chars().count();
    if name_len == 0 || name_len > MAX_SHEET_NAME_CHARS {
        return Err(PipelineError::Write(format!(
            "invalid sheet name '{}'",
            table.name
        )));
    }
    if table.name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        return Err(PipelineError::Write(format!(
            "sheet name '{}' contains a reserved character",
            table.name
        )));
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            match cell {
                Value::Number(n) if !n.is_finite() => {
                    return Err(PipelineError::Write(format!(
                        "{} row {} column {}: non-finite number {}",
                        table.name,
                        row_idx + 1,
                        col_idx + 1,
                        n
                    )));
                }
                Value::Text(s) if s.chars().count() > MAX_CELL_CHARS => {
                    return Err(PipelineError::Write(format!(
                        "{} row {} column {}: text longer than {} characters",
                        table.name,
                        row_idx + 1,
                        col_idx + 1,
                        MAX_CELL_CHARS
                    )));
                }
                _ => {}
            }
        }
    }

    debug!("Validated table '{}' ({} rows)", table.name, table.rows.len());
    Ok(())
}
