//! Terminal rendering of the current view.
//!
//! Summary cards, region/task breakdowns, text charts and the record
//! table. Everything renders into a `String` so callers decide where it
//! goes.

use crate::analysis::aggregator::{regions_per_task, task_share};
use crate::analysis::charts::{ChartData, ChartKind};
use crate::analysis::table::columns;
use crate::models::{Record, Summaries, SummaryCards};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A drawn chart. Destroying it releases whatever the renderer holds for it.
pub trait ChartHandle {
    fn destroy(self);
}

/// Draws charts from labels and numeric series.
pub trait ChartRenderer {
    type Handle: ChartHandle;

    /// Draw `chart` into the container named `container`.
    fn render(&mut self, container: &str, chart: &ChartData) -> Self::Handle;
}

/// Renders charts as horizontal text bars.
pub struct TextChartRenderer {
    width: usize,
    output: String,
    live: Rc<Cell<usize>>,
}

/// Handle for a chart drawn by [`TextChartRenderer`].
pub struct TextChart {
    container: String,
    live: Rc<Cell<usize>>,
}

impl TextChart {
    #[cfg(test)]
    pub fn container(&self) -> &str {
        &self.container
    }
}

impl ChartHandle for TextChart {
    fn destroy(self) {
        debug!("Destroying chart in {}", self.container);
        self.live.set(self.live.get().saturating_sub(1));
    }
}

impl TextChartRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            output: String::new(),
            live: Rc::new(Cell::new(0)),
        }
    }

    /// Number of charts drawn and not yet destroyed.
    #[cfg(test)]
    pub fn live_charts(&self) -> usize {
        self.live.get()
    }

    /// Take everything drawn so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn bar(&self, value: f64, max: f64) -> String {
        if max <= 0.0 || value <= 0.0 {
            return String::new();
        }
        let len = ((value / max) * self.width as f64).round().max(1.0) as usize;
        "█".repeat(len)
    }

    fn draw(&self, chart: &ChartData) -> String {
        let mut out = format!("📈 {}\n", chart.title);
        if chart.labels.is_empty() {
            out.push_str("   (no data)\n\n");
            return out;
        }

        let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        match (chart.kind, chart.stacked) {
            (ChartKind::Pie, _) => {
                let values = chart.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
                let total: f64 = values.iter().sum();
                for (label, value) in chart.labels.iter().zip(values) {
                    let pct = if total > 0.0 { value / total * 100.0 } else { 0.0 };
                    out.push_str(&format!(
                        "   {:<w$}  {:>5.1}% {} ({})\n",
                        label,
                        pct,
                        self.bar(*value, total),
                        value,
                        w = label_width
                    ));
                }
            }
            (ChartKind::Bar, true) => {
                let max = (0..chart.labels.len())
                    .map(|i| chart.total_at(i))
                    .fold(0.0, f64::max);
                for (i, label) in chart.labels.iter().enumerate() {
                    let total = chart.total_at(i);
                    out.push_str(&format!(
                        "   {:<w$}  {} {}\n",
                        label,
                        self.bar(total, max),
                        total,
                        w = label_width
                    ));
                    for series in &chart.series {
                        let value = series.values.get(i).copied().unwrap_or(0.0);
                        if value > 0.0 {
                            out.push_str(&format!(
                                "   {:<w$}    - {}: {}\n",
                                "",
                                series.name,
                                value,
                                w = label_width
                            ));
                        }
                    }
                }
            }
            (ChartKind::Bar, false) => {
                let values = chart.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
                let max = values.iter().copied().fold(0.0, f64::max);
                for (label, value) in chart.labels.iter().zip(values) {
                    out.push_str(&format!(
                        "   {:<w$}  {} {}\n",
                        label,
                        self.bar(*value, max),
                        value,
                        w = label_width
                    ));
                }
            }
        }

        out.push('\n');
        out
    }
}

impl ChartRenderer for TextChartRenderer {
    type Handle = TextChart;

    fn render(&mut self, container: &str, chart: &ChartData) -> TextChart {
        let drawn = self.draw(chart);
        self.output.push_str(&drawn);
        self.live.set(self.live.get() + 1);
        TextChart {
            container: container.to_string(),
            live: Rc::clone(&self.live),
        }
    }
}

/// Owns the currently drawn charts. Every redraw destroys the old set
/// before drawing the new one.
pub struct ChartBoard<R: ChartRenderer> {
    renderer: R,
    handles: Vec<R::Handle>,
}

impl<R: ChartRenderer> ChartBoard<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            handles: Vec::new(),
        }
    }

    /// Destroy every live chart, then draw `charts`.
    pub fn redraw(&mut self, charts: &[ChartData]) {
        self.clear();
        for (i, chart) in charts.iter().enumerate() {
            let handle = self.renderer.render(&format!("chart-{}", i), chart);
            self.handles.push(handle);
        }
    }

    /// Destroy every live chart.
    pub fn clear(&mut self) {
        for handle in self.handles.drain(..) {
            handle.destroy();
        }
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

/// Render the summary cards.
pub fn render_cards(cards: &SummaryCards) -> String {
    let mut out = String::from("📊 Summary\n");
    out.push_str(&format!(
        "   Total Records: {} | Regions: {} | Task Types: {} | Completed: {}\n",
        cards.total_records, cards.regions, cards.task_types, cards.completed
    ));
    if let (Some(region), Some(task)) = (&cards.busiest_region, &cards.top_task) {
        out.push_str(&format!(
            "   Busiest Region: {} | Top Task: {}\n",
            region, task
        ));
    }
    out.push('\n');
    out
}

/// Render per-region task breakdowns and per-task region spread.
pub fn render_breakdown(summaries: &Summaries) -> String {
    let mut out = String::new();
    if summaries.is_empty() {
        return out;
    }

    out.push_str("🗺️  Regions\n");
    for region in &summaries.regions {
        out.push_str(&format!("   {} ({} tasks)\n", region.region, region.total_count));
        let status = &region.status;
        out.push_str(&format!(
            "     {} {:.0}% complete | ✅ {} completed | ⏳ {} pending | 🚨 {} urgent\n",
            completion_bar(status.completion_rate()),
            status.completion_rate(),
            status.completed,
            status.pending,
            status.urgent
        ));
        for (task, count) in &region.task_counts {
            out.push_str(&format!("     - {}: {}\n", task, count));
        }
    }
    out.push('\n');

    out.push_str("🧰 Task Types\n");
    let spread = regions_per_task(summaries);
    for task in &summaries.tasks {
        let regions = spread.get(task.task.as_str()).copied().unwrap_or(0);
        out.push_str(&format!(
            "   {}: {} ({:.1}% of total, {} region{}, {} status type{})\n",
            task.task,
            task.total_count,
            task_share(summaries, task),
            regions,
            if regions == 1 { "" } else { "s" },
            task.statuses.len(),
            if task.statuses.len() == 1 { "" } else { "s" }
        ));
    }
    out.push('\n');
    out
}

/// Cells in a region's completion bar.
const COMPLETION_BAR_WIDTH: usize = 10;

fn completion_bar(rate: f64) -> String {
    let filled = ((rate / 100.0) * COMPLETION_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(COMPLETION_BAR_WIDTH);
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(COMPLETION_BAR_WIDTH - filled)
    )
}

/// Widest cell text shown in the table before truncation, in terminal
/// columns.
const MAX_CELL_WIDTH: usize = 24;

/// Render up to `max_rows` records as an aligned text table.
pub fn render_table(records: &[Record], max_rows: usize) -> String {
    if records.is_empty() {
        return "📋 No data available\n\n".to_string();
    }

    let headers = columns(records);
    let shown = &records[..records.len().min(max_rows)];

    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|h| {
                    record
                        .get(h)
                        .map(|v| truncate(&v.to_string()))
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "N/A".to_string())
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(truncate(h).width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("📋 Showing {} of {} records\n", shown.len(), records.len());
    out.push_str(&format_row(headers.iter().map(|h| truncate(h)), &widths));
    out.push_str(&format!(
        "   {}\n",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    ));
    for row in cells {
        out.push_str(&format_row(row.into_iter(), &widths));
    }
    out.push('\n');
    out
}

fn format_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, w)| {
            let pad = w.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    format!("   {}\n", line.trim_end())
}

fn truncate(s: &str) -> String {
    if s.width() <= MAX_CELL_WIDTH {
        return s.to_string();
    }

    let mut cut = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > MAX_CELL_WIDTH - 1 {
            break;
        }
        used += w;
        cut.push(c);
    }
    format!("{}…", cut)
}
