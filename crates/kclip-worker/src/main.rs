//! KaraokeClip worker binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kclip_media::{check_ffmpeg, Compositor, FfmpegRunner};
use kclip_models::timestamp::parse_seconds;
use kclip_subtitle::StyleRegistry;
use kclip_worker::{
    ClipOptions, ClipPipeline, RenderRequest, StaticSuggester, SubtitlePipeline, WorkerConfig,
    WorkerError, WorkerResult,
};

const USAGE: &str = "usage:
  kclip-worker timeline <clip_file> <transcript_name> <start> <end>
  kclip-worker render <request.json>
  kclip-worker clips <video_file> <model_output_file> [max_clips]";

#[derive(Debug, PartialEq)]
enum Command {
    Timeline {
        clip_file: String,
        transcript: String,
        start: String,
        end: String,
    },
    Render {
        request: PathBuf,
    },
    Clips {
        video_file: String,
        model_output: PathBuf,
        max_clips: Option<usize>,
    },
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            ["timeline", clip, transcript, start, end] => Command::Timeline {
                clip_file: clip.to_string(),
                transcript: transcript.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            },
            ["render", request] => Command::Render {
                request: PathBuf::from(request),
            },
            ["clips", video, output] => Command::Clips {
                video_file: video.to_string(),
                model_output: PathBuf::from(output),
                max_clips: None,
            },
            ["clips", video, output, max] => Command::Clips {
                video_file: video.to_string(),
                model_output: PathBuf::from(output),
                max_clips: Some(max.parse().with_context(|| format!("invalid max_clips '{}'", max))?),
            },
            _ => anyhow::bail!(USAGE),
        };
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("kclip=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid METRICS_ADDR '{}'", addr))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "Metrics exporter listening");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Err(e) = check_ffmpeg() {
        warn!("{}", e);
    }

    match run(command, &config).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!(kind = e.kind(), "Command failed: {}", e);
            let failure = json!({"error": {"kind": e.kind(), "message": e.to_string()}});
            println!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }
}

async fn run(command: Command, config: &WorkerConfig) -> WorkerResult<Value> {
    let layout = config.layout();
    layout.ensure_dirs().await?;
    let permits = Arc::new(Semaphore::new(config.max_ffmpeg_processes));

    match command {
        Command::Timeline {
            clip_file,
            transcript,
            start,
            end,
        } => {
            let start = seconds(&start)?;
            let end = seconds(&end)?;
            let timeline = subtitle_pipeline(config, permits)
                .timeline(&clip_file, &transcript, start, end)
                .await?;
            Ok(serde_json::to_value(timeline)?)
        }
        Command::Render { request } => {
            let json = tokio::fs::read_to_string(&request).await.map_err(|e| {
                WorkerError::invalid_request(format!(
                    "cannot read request {}: {}",
                    request.display(),
                    e
                ))
            })?;
            let request: RenderRequest = serde_json::from_str(&json)?;
            let outcome = subtitle_pipeline(config, permits).render(&request).await?;
            Ok(serde_json::to_value(outcome)?)
        }
        Command::Clips {
            video_file,
            model_output,
            max_clips,
        } => {
            let suggester = StaticSuggester::from_file(&model_output).await?;
            let pipeline = ClipPipeline::new(
                layout,
                FfmpegRunner::default().with_timeout(config.clip_timeout),
                permits,
                Arc::new(suggester),
            );
            let options = ClipOptions {
                max_clips: max_clips.unwrap_or(config.max_clips),
                policy: config.duration_policy(),
            };
            let clips = pipeline.generate(&video_file, options).await?;
            Ok(json!({ "clips": clips }))
        }
    }
}

fn subtitle_pipeline(config: &WorkerConfig, permits: Arc<Semaphore>) -> SubtitlePipeline {
    let registry = StyleRegistry::builtin().with_default(&config.default_style);
    let compositor = Compositor::new(
        FfmpegRunner::default().with_timeout(config.render_timeout),
        config.background_audio(),
    );
    SubtitlePipeline::new(config.layout(), Arc::new(registry), compositor, permits)
        .with_default_style(config.default_style.clone())
}

fn seconds(value: &str) -> WorkerResult<f64> {
    parse_seconds(value).map_err(|e| WorkerError::invalid_request(format!("'{}': {}", value, e)))
}
