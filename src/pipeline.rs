//! Pipeline controller.
//!
//! [`PipelineState`] is the record store: the full import, the active
//! filter, the filtered subset and its summaries. Every transition builds
//! a fresh state from scratch; nothing is patched in place.
//!
//! [`Pipeline`] owns the current state and stamps each state-replacing
//! request with a [`Ticket`]. Work that finishes after a newer request has
//! started is discarded, so the latest request always wins.

use std::sync::Arc;

use crate::analysis::charts::{all_charts, ChartData, FilterOptions};
use crate::analysis::{aggregate, filter_records};
use crate::error::PipelineError;
use crate::ingest::reader;
use crate::ingest::ImportPolicy;
use crate::models::{FilterState, Record, Summaries, SummaryCards};
use crate::report::{build_report, ExportBundle, ReportOptions};
use tracing::{debug, info};

/// Snapshot of the pipeline's data.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    records: Arc<Vec<Record>>,
    options: FilterOptions,
    filter: FilterState,
    filtered: Vec<Record>,
    summaries: Summaries,
}

impl PipelineState {
    /// State for a fresh import. The filter starts out empty.
    pub fn from_records(records: Vec<Record>) -> Self {
        let summaries = aggregate(&records);
        Self {
            options: FilterOptions::from_summaries(&summaries),
            filtered: records.clone(),
            records: Arc::new(records),
            filter: FilterState::default(),
            summaries,
        }
    }

    /// State with `filter` applied to the same import.
    pub fn with_filter(&self, filter: FilterState) -> Self {
        let filtered = filter_records(&self.records, &filter);
        let summaries = aggregate(&filtered);
        Self {
            records: Arc::clone(&self.records),
            options: self.options.clone(),
            filter,
            filtered,
            summaries,
        }
    }

    /// Every imported record, in import order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Records passing the active filter.
    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    /// Summaries of the filtered records.
    pub fn summaries(&self) -> &Summaries {
        &self.summaries
    }

    /// Region and task choices from the full import.
    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn cards(&self) -> SummaryCards {
        SummaryCards::from_summaries(self.filtered.len(), &self.summaries)
    }

    pub fn charts(&self) -> Vec<ChartData> {
        all_charts(&self.summaries)
    }
}

/// Result of a successful import.
#[derive(Debug)]
pub struct ImportView<'a> {
    pub records: &'a [Record],
    pub summaries: &'a Summaries,
}

/// Result of a filter change.
#[derive(Debug)]
pub struct FilterView<'a> {
    pub records: &'a [Record],
    pub summaries: &'a Summaries,
}

/// Generation stamp for a state-replacing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Owns the current [`PipelineState`] and applies events to it.
#[derive(Debug, Default)]
pub struct Pipeline {
    state: PipelineState,
    generation: u64,
    policy: ImportPolicy,
    report: ReportOptions,
}

impl Pipeline {
    pub fn new(policy: ImportPolicy, report: ReportOptions) -> Self {
        Self {
            state: PipelineState::default(),
            generation: 0,
            policy,
            report,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Size and extension rules applied to imports.
    pub fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    /// Start a request. Any ticket handed out earlier becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    /// Import raw workbook bytes.
    ///
    /// The size limit is checked before parsing, and parsing runs on the
    /// blocking pool. On any failure the previous state is kept unchanged.
    pub async fn on_import(&mut self, bytes: Vec<u8>) -> Result<ImportView<'_>, PipelineError> {
        self.policy.check_size(bytes.len() as u64)?;
        let ticket = self.begin();
        let records = tokio::task::spawn_blocking(move || reader::parse(&bytes))
            .await
            .map_err(|e| PipelineError::Parse(format!("import task failed: {}", e)))??;
        self.commit_import(ticket, records)
            .ok_or_else(|| PipelineError::Parse("import superseded".to_string()))
    }

    /// Replace the store with already-parsed records.
    ///
    /// Returns `None` and leaves the state alone if `ticket` is stale.
    pub fn commit_import(&mut self, ticket: Ticket, records: Vec<Record>) -> Option<ImportView<'_>> {
        if !self.is_current(ticket) {
            debug!("Discarding stale import (ticket {:?})", ticket);
            return None;
        }

        self.state = PipelineState::from_records(records);
        info!(
            "Imported {} records ({} regions, {} task types)",
            self.state.records.len(),
            self.state.summaries.regions.len(),
            self.state.summaries.tasks.len()
        );

        Some(ImportView {
            records: self.state.records(),
            summaries: self.state.summaries(),
        })
    }

    /// Apply a new filter to the current import.
    pub fn on_filter_change(&mut self, filter: FilterState) -> FilterView<'_> {
        let ticket = self.begin();
        let next = self.state.with_filter(filter);
        self.commit_state(ticket, next);
        FilterView {
            records: self.state.filtered(),
            summaries: self.state.summaries(),
        }
    }

    /// Install a filtered state computed elsewhere. Returns false if the
    /// ticket is stale.
    pub fn commit_state(&mut self, ticket: Ticket, next: PipelineState) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale filter result (ticket {:?})", ticket);
            return false;
        }

        info!(
            "Filter applied: {} of {} records",
            next.filtered.len(),
            next.records.len()
        );
        self.state = next;
        true
    }

    /// Build an export bundle from the filtered records. The state is
    /// never modified, whether or not the build succeeds.
    pub fn on_export_request(&self) -> Result<ExportBundle, PipelineError> {
        build_report(&self.state.filtered, &self.state.summaries, &self.report)
    }
}
