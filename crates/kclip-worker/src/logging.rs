//! Structured job logging.
//!
//! Every pipeline run logs its lifecycle through a [`JobLogger`] so start,
//! progress and failure lines carry the same `job_id` and `operation` fields.

use tracing::{error, info, warn, Span};

use crate::error::WorkerError;

/// Job logger with consistent lifecycle messages.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// # Arguments
    /// * `job_id` - Identifier of the unit of work, usually the file it acts on
    /// * `operation` - The pipeline running it (e.g. "generate_clips", "render_subtitles")
    pub fn new(job_id: impl Into<String>, operation: &str) -> Self {
        Self {
            job_id: job_id.into(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log a failed job with its error kind.
    pub fn log_failure(&self, err: &WorkerError) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            kind = err.kind(),
            "Job failed: {}", err
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
