/// Error types for leafscan.
///
/// Only configuration problems are allowed to stop a run. Everything else is
/// contained at the smallest scope it affects:
///
/// - `PathNotFound` / `NotADirectory`: one root is skipped with a warning
/// - `PermissionDenied`: one directory is treated as having no children
/// - `Extraction`: one file is treated as containing no match
/// - `Task`: one unit of parallel work is dropped
///
/// ```rust,ignore
/// match scanner.run(&roots, "anna") {
///     Ok(report) => // render report,
///     Err(ScanError::ConfigError(msg)) => // exit nonzero,
///     Err(e) => // unreachable for per-file problems
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while discovering folders or searching files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Folder not found: {0}")]
    PathNotFound(PathBuf),
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid search term: {0}")]
    InvalidPattern(String),
    #[error("Failed to extract {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },
    #[error("Task failed: {0}")]
    Task(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ScanError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(term: impl Into<String>) -> Self {
        Self::InvalidPattern(term.into())
    }

    pub fn extraction(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Extraction {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an IO error raised while touching `path` to the closest variant
    pub fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::path_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(e),
        }
    }
}
