//! Scripted [`ProcessRunner`] for tests.
//!
//! Records every invocation and plays back a fixed outcome. Failure and
//! timeout outcomes leave a partial file at the output path (the last
//! argument) so cleanup can be asserted.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{ProcessOutput, ProcessRunner};
use crate::error::{MediaError, MediaResult};

#[derive(Debug, Clone)]
enum Outcome {
    Success,
    Failure { code: i32, stderr: String },
    Timeout,
}

/// Fake process runner.
#[derive(Debug)]
pub struct FakeRunner {
    outcome: Outcome,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Exit 0 and write a small file to the output path.
    pub fn succeeding() -> Self {
        Self::with_outcome(Outcome::Success)
    }

    /// Exit with `code` and the given diagnostic output.
    pub fn failing(code: i32, stderr: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Failure {
            code,
            stderr: stderr.into(),
        })
    }

    /// Behave like a process that was killed at its deadline.
    pub fn timing_out() -> Self {
        Self::with_outcome(Outcome::Timeout)
    }

    /// Recorded `(program, args)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Arguments of the most recent call.
    pub fn last_args(&self) -> Vec<String> {
        self.calls().pop().map(|(_, args)| args).unwrap_or_default()
    }
}

async fn touch(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    let _ = tokio::fs::write(path, contents).await;
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((program.to_string(), args.to_vec()));
        }
        let output = args.last().map(Path::new);

        match &self.outcome {
            Outcome::Success => {
                if let Some(path) = output {
                    touch(path, b"rendered").await;
                }
                Ok(ProcessOutput {
                    status_code: Some(0),
                    ..Default::default()
                })
            }
            Outcome::Failure { code, stderr } => {
                if let Some(path) = output {
                    touch(path, b"partial").await;
                }
                Ok(ProcessOutput {
                    status_code: Some(*code),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                })
            }
            Outcome::Timeout => {
                if let Some(path) = output {
                    touch(path, b"partial").await;
                }
                Err(MediaError::Timeout(timeout.as_secs()))
            }
        }
    }
}
