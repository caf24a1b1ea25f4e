//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use kclip_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Default wall-clock limit for a single FFmpeg invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

#[derive(Debug, Clone)]
struct Input {
    /// Arguments placed before this input's `-i`
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order; the first is the primary input
    inputs: Vec<Input>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![Input {
                args: Vec::new(),
                path: input.as_ref().to_path_buf(),
            }],
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a secondary input with its own input options.
    pub fn add_input<I, S>(mut self, path: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Add an argument before the primary input's -i.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(primary) = self.inputs.first_mut() {
            primary.args.push(arg.into());
        }
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Select a stream or filter output label for the output file.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Video codec, preset and CRF from an encoding config.
    pub fn video_encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.video_args())
    }

    /// Audio re-encode settings from an encoding config.
    pub fn audio_encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.audio_args())
    }

    /// Container flags (fast start) from an encoding config.
    pub fn container(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.container_args())
    }

    /// End the output with the shortest stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Exit status and captured streams of a finished process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Runs an external program to completion under a wall-clock limit.
///
/// Implementations must kill the process and return [`MediaError::Timeout`]
/// when the limit is hit. A non-zero exit is not an error at this level.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::ProgramNotFound(program.to_string()),
                _ => MediaError::Io(e),
            })?;

        // Drain both pipes concurrently so a chatty process cannot block on a full pipe
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    program,
                    timeout_secs = timeout.as_secs(),
                    "Process timed out, killing it"
                );
                if let Err(e) = child.kill().await {
                    warn!(program, error = %e, "Failed to kill timed out process");
                }
                return Err(MediaError::Timeout(timeout.as_secs()));
            }
        };

        Ok(ProcessOutput {
            status_code: status.code(),
            stdout: collect(stdout).await,
            stderr: collect(stderr).await,
        })
    }
}

fn spawn_reader<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Stopped reading process output");
        }
        buf
    })
}

async fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    match handle {
        Some(handle) => handle
            .await
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Runs [`FfmpegCommand`]s through a [`ProcessRunner`].
///
/// On timeout or non-zero exit the command's output file is removed so a
/// truncated video is never left behind. Failures are not retried.
#[derive(Clone)]
pub struct FfmpegRunner {
    runner: Arc<dyn ProcessRunner>,
    program: String,
    timeout: Duration,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }
}

impl std::fmt::Debug for FfmpegRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegRunner")
            .field("program", &self.program)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            program: "ffmpeg".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a different ffmpeg binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run an FFmpeg command. `operation` labels logs and metrics.
    pub async fn run(&self, cmd: &FfmpegCommand, operation: &str) -> MediaResult<()> {
        let args = cmd.build_args();
        debug!(operation, "Running FFmpeg: {} {}", self.program, args.join(" "));

        metrics::record_render_started(operation);
        let started = Instant::now();

        let result = match self.runner.run(&self.program, &args, self.timeout).await {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(MediaError::ffmpeg_failed(
                format!(
                    "{} exited with status {}",
                    self.program,
                    output
                        .status_code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string())
                ),
                Some(output.stderr),
                output.status_code,
            )),
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(()) => {
                metrics::record_render_succeeded(operation, elapsed);
                info!(
                    operation,
                    output = %cmd.output_path().display(),
                    elapsed_secs = elapsed,
                    "FFmpeg finished"
                );
            }
            Err(e) => {
                match e {
                    MediaError::Timeout(_) => metrics::record_render_timed_out(operation),
                    _ => metrics::record_render_failed(operation),
                }
                remove_partial_output(cmd.output_path()).await;
            }
        }

        result
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::ProgramNotFound("ffmpeg".to_string()))
}
