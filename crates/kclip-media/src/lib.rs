//! FFmpeg CLI wrapper for clip rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A narrow process runner interface with a tokio implementation
//! - Timeout supervision with partial-output cleanup
//! - Clip extraction and the crop, subtitle burn and audio mix composition
//! - Background audio resolution and render metrics

pub mod audio;
pub mod clip;
pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod metrics;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use audio::{AudioOrigin, AudioSource, BackgroundAudioConfig};
pub use clip::render_clip;
pub use command::{
    check_ffmpeg, FfmpegCommand, FfmpegRunner, ProcessOutput, ProcessRunner, TokioProcessRunner,
};
pub use compose::{CompositionPlan, Compositor, RenderJob};
pub use error::{MediaError, MediaResult};
