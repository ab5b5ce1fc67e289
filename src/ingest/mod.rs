//! Spreadsheet import.
//!
//! This module enforces the input policy (allowed extensions, maximum
//! file size) and reads file bytes. Size and type are checked before any
//! parse attempt; parsing itself lives in [`reader`].

pub mod reader;

use crate::error::PipelineError;
use std::path::Path;
use tracing::{debug, info};

/// Input policy for imported files.
#[derive(Debug, Clone)]
pub struct ImportPolicy {
    /// Accepted file extensions, lowercase, without the dot.
    pub extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            extensions: vec!["xlsx", "xls", "xlsb", "ods"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl From<&crate::config::ImportConfig> for ImportPolicy {
    fn from(config: &crate::config::ImportConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        }
    }
}

impl ImportPolicy {
    /// Reject files whose extension is not in the allow list.
    pub fn check_extension(&self, path: &Path) -> Result<(), PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if self.extensions.iter().any(|allowed| *allowed == ext) {
            Ok(())
        } else {
            Err(PipelineError::UnsupportedFileType(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ))
        }
    }

    /// Reject inputs larger than the configured maximum.
    pub fn check_size(&self, size: u64) -> Result<(), PipelineError> {
        if size > self.max_file_size {
            return Err(PipelineError::SizeLimitExceeded {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }
}

/// Read a spreadsheet file's bytes after checking type and size.
///
/// The size is taken from file metadata, so oversized files are rejected
/// without being read.
pub async fn read_input(path: &Path, policy: &ImportPolicy) -> Result<Vec<u8>, PipelineError> {
    policy.check_extension(path)?;

    let metadata = tokio::fs::metadata(path).await?;
    debug!("{} is {} bytes", path.display(), metadata.len());
    policy.check_size(metadata.len())?;

    let bytes = tokio::fs::read(path).await?;
    // The file may have grown between the metadata call and the read.
    policy.check_size(bytes.len() as u64)?;

    info!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Human-readable file size (e.g. "1.5 KB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_check_extension() {
        let policy = ImportPolicy::default();
        assert!(policy.check_extension(Path::new("data.xlsx")).is_ok());
        assert!(policy.check_extension(Path::new("DATA.XLS")).is_ok());

        let err = policy.check_extension(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFileType(ref n) if n == "notes.txt"));
        assert!(policy.check_extension(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_check_size() {
        let policy = ImportPolicy {
            max_file_size: 100,
            ..Default::default()
        };
        assert!(policy.check_size(100).is_ok());
        assert!(matches!(
            policy.check_size(101),
            Err(PipelineError::SizeLimitExceeded {
                size: 101,
                limit: 100
            })
        ));
    }

    #[test]
    fn test_read_input_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("big.xlsx");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let policy = ImportPolicy {
            max_file_size: 32,
            ..Default::default()
        };
        let result = tokio_test::block_on(read_input(&path, &policy));
        assert!(matches!(
            result,
            Err(PipelineError::SizeLimitExceeded { size: 64, .. })
        ));
    }

    #[test]
    fn test_read_input_returns_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.xlsx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let bytes = tokio_test::block_on(read_input(&path, &ImportPolicy::default())).unwrap();
        assert_eq!(bytes, b"PK\x03\x04");
    }

    #[test]
    fn test_read_input_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.xlsx");
        let result = tokio_test::block_on(read_input(&path, &ImportPolicy::default()));
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }
}
