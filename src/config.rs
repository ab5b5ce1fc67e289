//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sheetlens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".sheetlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Import settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Spreadsheet import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Accepted file extensions.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            extensions: default_extensions(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_extensions() -> Vec<String> {
    vec!["xlsx", "xls", "xlsb", "ods"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Terminal display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum table rows shown.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Draw charts in text output.
    #[serde(default = "default_true")]
    pub show_charts: bool,

    /// Width of the longest chart bar, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            show_charts: true,
            chart_width: default_chart_width(),
        }
    }
}

fn default_max_rows() -> usize {
    50
}

fn default_chart_width() -> usize {
    40
}

fn default_true() -> bool {
    true
}

/// Export report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Label written into the Summary sheet.
    #[serde(default = "default_label")]
    pub label: String,

    /// Default xlsx output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// `chrono` format string for the generation timestamp.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Append the region×task crosstab sheet.
    #[serde(default)]
    pub include_crosstab: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            output: default_output(),
            timestamp_format: default_timestamp_format(),
            include_crosstab: false,
        }
    }
}

fn default_label() -> String {
    "Excel Data Analyzer Report".to_string()
}

fn default_output() -> String {
    "Excel_Analysis_Report.xlsx".to_string()
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.sheetlens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(max_file_size) = args.max_file_size {
            self.import.max_file_size = max_file_size;
        }

        if let Some(max_rows) = args.max_rows {
            self.display.max_rows = max_rows;
        }
        if args.no_charts {
            self.display.show_charts = false;
        }

        if let Some(ref label) = args.label {
            self.report.label = label.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then `--verbose` or
    /// `general.verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
