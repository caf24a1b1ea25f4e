//! Error types for subtitle operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for subtitle operations.
pub type SubtitleResult<T> = Result<T, SubtitleError>;

/// Compilation itself never fails; only persisting the document can.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("Failed to write subtitle document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SubtitleError {
    /// Stable failure kind for structured error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            SubtitleError::Write { .. } => "io",
        }
    }
}
