//! Karaoke subtitle generation.
//!
//! This crate provides:
//! - A registry of named caption style presets
//! - Greedy phrase segmentation of word timings
//! - Compilation of clip timelines into ASS documents with per-word
//!   karaoke reveal tags and an optional hook overlay

pub mod compiler;
pub mod document;
pub mod error;
pub mod phrase;
pub mod preset;

pub use compiler::{CanvasLayout, SubtitleCompiler, HOOK_DURATION_SECS};
pub use document::{AssStyle, Event, SubtitleDocument};
pub use error::{SubtitleError, SubtitleResult};
pub use phrase::{segment_phrases, DEFAULT_MAX_CHARS};
pub use preset::{StylePreset, StyleRegistry, DEFAULT_PRESET};
