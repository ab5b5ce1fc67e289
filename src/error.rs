//! Pipeline error types.
//!
//! Only the boundary operations (size check, parse, write) fail; the
//! aggregation and filter functions are total.

use std::io;

use thiserror::Error;

/// Error type for import, export, and input policy failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read spreadsheet: {0}")]
    Parse(String),
    #[error("failed to generate report: {0}")]
    Write(String),
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded { size: u64, limit: u64 },
    #[error("unsupported file type '{0}' (expected a spreadsheet such as .xlsx or .xls)")]
    UnsupportedFileType(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// Returns true for errors raised before any parse attempt.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            PipelineError::SizeLimitExceeded { .. } | PipelineError::UnsupportedFileType(_)
        )
    }
}

impl From<calamine::Error> for PipelineError {
    fn from(err: calamine::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for PipelineError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        PipelineError::Write(err.to_string())
    }
}
