//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::FilterState;
use clap::Parser;
use std::path::PathBuf;

/// Sheetlens - region and task breakdowns for spreadsheet exports
///
/// Import a workbook, filter it by region, task type or free text, and
/// view summary cards, charts and the record table. Optionally export an
/// xlsx report of the filtered view.
///
/// Examples:
///   sheetlens --input jobs.xlsx
///   sheetlens --input jobs.xlsx --region east --task install
///   sheetlens --input jobs.xlsx --search north --search-column Notes
///   sheetlens --input jobs.xlsx --format markdown --output view.md
///   sheetlens --input jobs.xlsx --export-default
///   sheetlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Spreadsheet to import (.xlsx, .xls, .xlsb, .ods)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Only keep records whose region matches (case-insensitive)
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Only keep records whose task type matches (case-insensitive)
    #[arg(long, value_name = "TASK")]
    pub task: Option<String>,

    /// Free-text search over record values
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Restrict --search to a single column
    ///
    /// Column names match case-insensitively. Without this, every column
    /// is searched.
    #[arg(long, value_name = "COLUMN")]
    pub search_column: Option<String>,

    /// Sort the displayed table by this column
    #[arg(long, value_name = "COLUMN")]
    pub sort_column: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort_column")]
    pub sort_desc: bool,

    /// Maximum number of table rows to display
    #[arg(long, value_name = "ROWS")]
    pub max_rows: Option<usize>,

    /// Output format (text, json, markdown)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the rendered view to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export the filtered view as an xlsx report
    #[arg(short, long, value_name = "FILE", conflicts_with = "export_default")]
    pub export: Option<PathBuf>,

    /// Export the xlsx report to the configured default path
    #[arg(long)]
    pub export_default: bool,

    /// Label written into the report's Summary sheet
    #[arg(long, value_name = "TEXT")]
    pub label: Option<String>,

    /// Do not draw charts in text output
    #[arg(long)]
    pub no_charts: bool,

    /// Print the available region and task filter values and exit
    #[arg(long)]
    pub list_options: bool,

    /// Maximum input file size in bytes
    #[arg(long, value_name = "BYTES", env = "SHEETLENS_MAX_FILE_SIZE")]
    pub max_file_size: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sheetlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sheetlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text with cards, charts and a table (default)
    #[default]
    Text,
    /// JSON format
    Json,
    /// Markdown format
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.max_file_size == Some(0) {
            return Err("Max file size must be at least 1 byte".to_string());
        }

        if self.max_rows == Some(0) {
            return Err("Max rows must be at least 1".to_string());
        }

        if self.search_column.is_some() && self.search.is_none() {
            return Err("--search-column requires --search".to_string());
        }

        match self.input {
            None => return Err("An input file is required (--input FILE)".to_string()),
            Some(ref path) if !path.is_file() => {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// The filter described by --region, --task, --search and
    /// --search-column.
    pub fn filter_state(&self) -> FilterState {
        let mut state = FilterState::new();
        if let Some(ref region) = self.region {
            state = state.with_region(region.as_str());
        }
        if let Some(ref task) = self.task {
            state = state.with_task(task.as_str());
        }
        if let Some(ref search) = self.search {
            state = state.with_search(search.as_str(), self.search_column.clone());
        }
        state
    }

    /// Where to write the xlsx report, if anywhere.
    pub fn export_path(&self, default_output: &str) -> Option<PathBuf> {
        match (&self.export, self.export_default) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(PathBuf::from(default_output)),
            (None, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(input: &NamedTempFile) -> Args {
        Args {
            input: Some(input.path().to_path_buf()),
            region: None,
            task: None,
            search: None,
            search_column: None,
            sort_column: None,
            sort_desc: false,
            max_rows: None,
            format: OutputFormat::Text,
            output: None,
            export: None,
            export_default: false,
            label: None,
            no_charts: false,
            list_options: false,
            max_file_size: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        let file = NamedTempFile::new().unwrap();
        assert!(make_args(&file).validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        args.input = Some(PathBuf::from("/nonexistent/jobs.xlsx"));
        assert!(args.validate().unwrap_err().contains("does not exist"));

        args.input = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_limits() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        args.max_file_size = Some(0);
        assert!(args.validate().is_err());

        args.max_file_size = None;
        args.max_rows = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_search_column_needs_search() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        args.search_column = Some("Notes".to_string());
        assert!(args.validate().is_err());

        args.search = Some("north".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_filter_state() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        assert!(args.filter_state().is_empty());

        args.region = Some("East".to_string());
        args.search = Some("pump".to_string());
        args.search_column = Some("Notes".to_string());
        let state = args.filter_state();
        assert_eq!(state.region(), Some("East"));
        assert_eq!(state.task(), None);
        assert_eq!(state.search(), Some("pump"));
        assert_eq!(state.column(), Some("Notes"));
    }

    #[test]
    fn test_export_path() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(&file);
        assert_eq!(args.export_path("default.xlsx"), None);

        args.export_default = true;
        assert_eq!(
            args.export_path("default.xlsx"),
            Some(PathBuf::from("default.xlsx"))
        );

        args.export = Some(PathBuf::from("mine.xlsx"));
        assert_eq!(args.export_path("default.xlsx"), Some(PathBuf::from("mine.xlsx")));
    }
}
