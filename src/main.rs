//! Sheetlens - region and task breakdowns for spreadsheet exports
//!
//! A CLI tool that imports a workbook, groups its records by region and
//! task type, applies filters, and renders the result as text, Markdown
//! or JSON, with an optional xlsx report export.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid input, parse failure, export failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod pipeline;
mod report;

use analysis::charts::FilterOptions;
use analysis::table::{sort_records, SortDirection};
use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use ingest::{format_file_size, ImportPolicy};
use pipeline::{Pipeline, PipelineState};
use report::builder::DETAILED_SHEET;
use report::terminal::{self, ChartBoard, TextChartRenderer};
use report::{ReportOptions, ViewMetadata, ViewReport};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Logging depends on the config file's verbosity, so load it first
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_level(args.quiet))?;

    info!("Sheetlens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .sheetlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize size limits, display, and report output.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Import, filter, render, and optionally export.
async fn run(args: Args, config: Config) -> Result<()> {
    let input = args.input.clone().context("No input file given")?;
    let mut pipeline = Pipeline::new(
        ImportPolicy::from(&config.import),
        ReportOptions::from(&config.report),
    );

    // Step 1: Read and parse the workbook
    if !args.quiet {
        println!("📥 Importing: {}", input.display());
    }
    let bytes = match ingest::read_input(&input, pipeline.policy()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.is_rejected_input() {
                warn!("Rejected {}: {}", input.display(), e);
            }
            return Err(e).with_context(|| format!("Failed to import {}", input.display()));
        }
    };
    if !args.quiet {
        println!("   Size: {}", format_file_size(bytes.len() as u64));
    }

    let spinner = spinner(&args, "Parsing workbook...");
    let imported = pipeline.on_import(bytes).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let view = imported.with_context(|| format!("Failed to import {}", input.display()))?;
    if !args.quiet {
        println!(
            "   Records: {} | Regions: {} | Task types: {}\n",
            view.records.len(),
            view.summaries.regions.len(),
            view.summaries.tasks.len()
        );
    }

    if args.list_options {
        print!("{}", render_filter_options(pipeline.state().filter_options()));
        return Ok(());
    }

    // Step 2: Apply filters
    let filter = args.filter_state();
    if !filter.is_empty() {
        let view = pipeline.on_filter_change(filter);
        if view.records.is_empty() {
            warn!("No records match the current filters");
        } else {
            debug!(
                "Filtered view: {} records in {} regions",
                view.records.len(),
                view.summaries.regions.len()
            );
        }
    }

    // Step 3: Render the view
    render_view(&args, &config, &input, pipeline.state())?;

    // Step 4: Export
    if let Some(path) = args.export_path(&config.report.output) {
        export_report(&args, &pipeline, &path).await?;
    }

    Ok(())
}

/// Render the current view in the requested format, to stdout or a file.
fn render_view(args: &Args, config: &Config, input: &Path, state: &PipelineState) -> Result<()> {
    let mut rows = state.filtered().to_vec();
    if let Some(ref column) = args.sort_column {
        let direction = if args.sort_desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        sort_records(&mut rows, column, direction);
    }

    let output = match args.format {
        OutputFormat::Text => render_text(config, state, &rows),
        OutputFormat::Json | OutputFormat::Markdown => {
            let metadata = ViewMetadata {
                source_file: input.display().to_string(),
                generated_at: Local::now(),
                imported_records: state.records().len(),
                filtered_records: rows.len(),
            };
            let view = ViewReport::new(
                metadata,
                state.filter(),
                state.summaries(),
                state.filter_options().clone(),
                &rows,
            );
            if args.format == OutputFormat::Json {
                report::generate_json_report(&view)?
            } else {
                report::generate_markdown_report(&view, config.display.max_rows)
            }
        }
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write view to {}", path.display()))?;
            if !args.quiet {
                println!("✅ View saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn render_text(config: &Config, state: &PipelineState, rows: &[models::Record]) -> String {
    let mut output = String::new();

    let filter = state.filter();
    if !filter.is_empty() {
        let mut parts = Vec::new();
        if let Some(region) = filter.region() {
            parts.push(format!("region = {}", region));
        }
        if let Some(task) = filter.task() {
            parts.push(format!("task = {}", task));
        }
        if let Some(search) = filter.search() {
            match filter.column() {
                Some(column) => parts.push(format!("{} contains \"{}\"", column, search)),
                None => parts.push(format!("any column contains \"{}\"", search)),
            }
        }
        output.push_str(&format!("🔎 Filter: {}\n\n", parts.join(", ")));
    }

    output.push_str(&terminal::render_cards(&state.cards()));
    output.push_str(&terminal::render_breakdown(state.summaries()));

    if config.display.show_charts {
        let mut board = ChartBoard::new(TextChartRenderer::new(config.display.chart_width));
        board.redraw(&state.charts());
        output.push_str(&board.renderer_mut().take_output());
        board.clear();
    }

    output.push_str(&terminal::render_table(rows, config.display.max_rows));
    output
}

fn render_filter_options(options: &FilterOptions) -> String {
    let mut output = String::from("🗺️  Regions:\n");
    for region in &options.regions {
        output.push_str(&format!("   {}\n", region));
    }
    output.push_str("\n🧰 Task types:\n");
    for task in &options.tasks {
        output.push_str(&format!("   {}\n", task));
    }
    output
}

/// Build the report from the filtered view and write it as xlsx.
async fn export_report(args: &Args, pipeline: &Pipeline, path: &Path) -> Result<()> {
    if !args.quiet {
        println!("📝 Generating report...");
    }

    let bundle = pipeline
        .on_export_request()
        .context("Failed to build report")?;
    debug!("Report tables: {:?}", bundle.table_names());
    let detailed_rows = bundle
        .table(DETAILED_SHEET)
        .map(|table| table.data_rows().len())
        .unwrap_or_default();

    let spinner = spinner(args, "Writing workbook...");
    let written = report::export_to_file(bundle, path).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let written =
        written.with_context(|| format!("Failed to write report to {}", path.display()))?;

    if !args.quiet {
        println!(
            "\n✅ Report saved to: {} ({}, {} detail rows)",
            path.display(),
            format_file_size(written as u64),
            detailed_rows
        );
    }
    Ok(())
}

/// A ticking spinner, unless running quietly.
fn spinner(args: &Args, message: &'static str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
