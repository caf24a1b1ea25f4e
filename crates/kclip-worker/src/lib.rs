//! KaraokeClip worker.
//!
//! This crate provides:
//! - Environment configuration
//! - Structured job logging
//! - Clip suggestion parsing behind a pluggable model client
//! - The clip generation and subtitle render pipelines

pub mod candidates;
pub mod clip_pipeline;
pub mod config;
pub mod error;
pub mod logging;
pub mod subtitle_pipeline;

pub use candidates::{extract_json, merge_candidates, suggest_candidates, ClipSuggester, StaticSuggester};
pub use clip_pipeline::{ClipOptions, ClipPipeline, GeneratedClip};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use subtitle_pipeline::{RenderOutcome, RenderRequest, SubtitlePipeline};
