//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Clip suggestion failed: {0}")]
    Suggestion(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] kclip_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] kclip_media::MediaError),

    #[error("Subtitle error: {0}")]
    Subtitle(#[from] kclip_subtitle::SubtitleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn suggestion(msg: impl Into<String>) -> Self {
        Self::Suggestion(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Stable failure kind for structured error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::InvalidRequest(_) => "invalid_input",
            WorkerError::Suggestion(_) => "suggestion",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Storage(e) => e.kind(),
            WorkerError::Media(e) => e.kind(),
            WorkerError::Subtitle(e) => e.kind(),
            WorkerError::Json(_) => "serialization",
            WorkerError::Io(_) => "io",
        }
    }
}
