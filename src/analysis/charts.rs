//! Chart data for the three summary charts.
//!
//! Only labels and numeric series are produced here; drawing is the job
//! of a [`crate::report::terminal::ChartRenderer`].

use crate::models::Summaries;
use serde::{Deserialize, Serialize};

/// Kind of chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

/// One named numeric series, aligned with the chart labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Labels and series for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    /// Series are stacked per label rather than drawn side by side.
    #[serde(default)]
    pub stacked: bool,
}

impl ChartData {
    /// Sum of every series value at label `index`.
    pub fn total_at(&self, index: usize) -> f64 {
        self.series
            .iter()
            .filter_map(|s| s.values.get(index))
            .sum()
    }
}

/// Records per region.
pub fn regions_chart(summaries: &Summaries) -> ChartData {
    ChartData {
        title: "Tasks by Region".to_string(),
        kind: ChartKind::Bar,
        labels: summaries.regions.iter().map(|r| r.region.clone()).collect(),
        series: vec![Series {
            name: "Tasks Count".to_string(),
            values: summaries
                .regions
                .iter()
                .map(|r| r.total_count as f64)
                .collect(),
        }],
        stacked: false,
    }
}

/// Share of each task type.
pub fn tasks_chart(summaries: &Summaries) -> ChartData {
    ChartData {
        title: "Task Types Distribution".to_string(),
        kind: ChartKind::Pie,
        labels: summaries.tasks.iter().map(|t| t.task.clone()).collect(),
        series: vec![Series {
            name: "Tasks Count".to_string(),
            values: summaries
                .tasks
                .iter()
                .map(|t| t.total_count as f64)
                .collect(),
        }],
        stacked: false,
    }
}

/// Region×task crosstab as one stacked series per task.
pub fn crosstab_chart(summaries: &Summaries) -> ChartData {
    let labels: Vec<String> = summaries.regions.iter().map(|r| r.region.clone()).collect();
    let series = summaries
        .tasks
        .iter()
        .map(|t| Series {
            name: t.task.clone(),
            values: labels
                .iter()
                .map(|region| summaries.count(region, &t.task) as f64)
                .collect(),
        })
        .collect();

    ChartData {
        title: "Tasks by Region and Type".to_string(),
        kind: ChartKind::Bar,
        labels,
        series,
        stacked: true,
    }
}

/// All three charts in display order.
pub fn all_charts(summaries: &Summaries) -> Vec<ChartData> {
    vec![
        regions_chart(summaries),
        tasks_chart(summaries),
        crosstab_chart(summaries),
    ]
}

/// Filter option lists: distinct regions and tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub tasks: Vec<String>,
}

impl FilterOptions {
    pub fn from_summaries(summaries: &Summaries) -> Self {
        Self {
            regions: summaries
                .distinct_regions()
                .into_iter()
                .map(String::from)
                .collect(),
            tasks: summaries.distinct_tasks().into_iter().map(String::from).collect(),
        }
    }
}
