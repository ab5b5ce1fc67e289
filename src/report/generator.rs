//! Markdown and JSON rendering of the current view.
//!
//! This module turns the filtered records and their summaries into a
//! Markdown document or a JSON object, for writing to stdout or a file.

use crate::analysis::aggregator::{task_share, top_regions, top_tasks};
use crate::analysis::charts::{all_charts, ChartData, FilterOptions};
use crate::analysis::table::columns;
use crate::models::{FilterState, Record, Summaries, SummaryCards};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Metadata about the rendered view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewMetadata {
    /// Input file the records came from.
    pub source_file: String,
    /// When the view was rendered.
    pub generated_at: DateTime<Local>,
    /// Records in the full import.
    pub imported_records: usize,
    /// Records left after filtering.
    pub filtered_records: usize,
}

/// Everything a renderer needs for one view.
#[derive(Debug, Serialize)]
pub struct ViewReport<'a> {
    pub metadata: ViewMetadata,
    pub filter: &'a FilterState,
    pub cards: SummaryCards,
    pub summaries: &'a Summaries,
    /// Filter choices, taken from the full import.
    pub filter_options: FilterOptions,
    pub charts: Vec<ChartData>,
    pub records: &'a [Record],
}

impl<'a> ViewReport<'a> {
    pub fn new(
        metadata: ViewMetadata,
        filter: &'a FilterState,
        summaries: &'a Summaries,
        filter_options: FilterOptions,
        records: &'a [Record],
    ) -> Self {
        Self {
            cards: SummaryCards::from_summaries(records.len(), summaries),
            charts: all_charts(summaries),
            metadata,
            filter,
            summaries,
            filter_options,
            records,
        }
    }
}

/// Generate a JSON rendering of the view.
pub fn generate_json_report(report: &ViewReport<'_>) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a complete Markdown rendering of the view.
///
/// At most `max_rows` records are listed in the data section.
pub fn generate_markdown_report(report: &ViewReport<'_>, max_rows: usize) -> String {
    let mut output = String::new();

    output.push_str("# Sheetlens Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, report.filter));
    output.push_str(&generate_summary_section(&report.cards, report.summaries));
    output.push_str(&generate_regions_section(report.summaries));
    output.push_str(&generate_tasks_section(report.summaries));
    output.push_str(&generate_crosstab_section(report.summaries));
    output.push_str(&generate_data_section(report.records, max_rows));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ViewMetadata, filter: &FilterState) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source File:** `{}`\n", metadata.source_file));
    section.push_str(&format!(
        "- **Generated At:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    section.push_str(&format!(
        "- **Imported Records:** {}\n",
        metadata.imported_records
    ));
    section.push_str(&format!(
        "- **Filtered Records:** {}\n",
        metadata.filtered_records
    ));

    if let Some(region) = filter.region() {
        section.push_str(&format!("- **Region Filter:** {}\n", region));
    }
    if let Some(task) = filter.task() {
        section.push_str(&format!("- **Task Filter:** {}\n", task));
    }
    if let Some(search) = filter.search() {
        match filter.column() {
            Some(column) => {
                section.push_str(&format!("- **Search:** \"{}\" in `{}`\n", search, column))
            }
            None => section.push_str(&format!("- **Search:** \"{}\"\n", search)),
        }
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(cards: &SummaryCards, summaries: &Summaries) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Total Records | Regions | Task Types | Completed |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        cards.total_records, cards.regions, cards.task_types, cards.completed
    ));

    let regions = top_regions(summaries, 5);
    if !regions.is_empty() {
        section.push_str("### Top 5 Regions by Task Count\n\n");
        for (i, region) in regions.iter().enumerate() {
            section.push_str(&format!(
                "{}. {} ({})\n",
                i + 1,
                region.region,
                region.total_count
            ));
        }
        section.push('\n');
    }

    let tasks = top_tasks(summaries, 5);
    if !tasks.is_empty() {
        section.push_str("### Top 5 Task Types\n\n");
        for (i, task) in tasks.iter().enumerate() {
            section.push_str(&format!("{}. {} ({})\n", i + 1, task.task, task.total_count));
        }
        section.push('\n');
    }

    section
}

/// Generate the regions table.
fn generate_regions_section(summaries: &Summaries) -> String {
    let mut section = String::new();

    section.push_str("## Regions\n\n");
    section.push_str("| Region | Task Count | Completed | Pending | Urgent | Completion |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");
    for region in &summaries.regions {
        let status = &region.status;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.1}% |\n",
            escape_cell(&region.region),
            region.total_count,
            status.completed,
            status.pending,
            status.urgent,
            status.completion_rate()
        ));
    }
    section.push('\n');

    section
}

/// Generate the tasks table.
fn generate_tasks_section(summaries: &Summaries) -> String {
    let mut section = String::new();

    section.push_str("## Tasks\n\n");
    section.push_str("| Task Type | Count | % of Total | Status Types |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for task in &summaries.tasks {
        section.push_str(&format!(
            "| {} | {} | {:.1}% | {} |\n",
            escape_cell(&task.task),
            task.total_count,
            task_share(summaries, task),
            task.statuses.len()
        ));
    }
    section.push('\n');

    section
}

/// Generate the region×task crosstab.
fn generate_crosstab_section(summaries: &Summaries) -> String {
    if summaries.is_empty() {
        return String::new();
    }

    let tasks = summaries.distinct_tasks();
    let mut section = String::new();

    section.push_str("## Tasks by Region and Type\n\n");
    section.push_str("| Region |");
    for task in &tasks {
        section.push_str(&format!(" {} |", escape_cell(task)));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(tasks.len()));
    section.push('\n');

    for region in &summaries.regions {
        section.push_str(&format!("| {} |", escape_cell(&region.region)));
        for task in &tasks {
            section.push_str(&format!(" {} |", summaries.count(&region.region, task)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the detailed data section.
fn generate_data_section(records: &[Record], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Detailed Data\n\n");

    if records.is_empty() {
        section.push_str("No records match the current filters.\n\n");
        return section;
    }

    let headers = columns(records);
    section.push_str(&format!(
        "| {} |\n",
        headers
            .iter()
            .map(|h| escape_cell(h))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    section.push_str(&format!("|{}\n", ":---|".repeat(headers.len())));

    for record in records.iter().take(max_rows) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| {
                record
                    .get(h)
                    .map(|v| escape_cell(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if records.len() > max_rows {
        section.push_str(&format!(
            "\n*{} more records not shown.*\n",
            records.len() - max_rows
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by Sheetlens*\n");

    footer
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
