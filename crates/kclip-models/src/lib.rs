//! Shared data models for KaraokeClip backend.
//!
//! This crate provides Serde-serializable types for:
//! - Transcripts, segments and word timings
//! - Clip-relative subtitle timelines
//! - Clip candidates and the boundary normalizer that turns them into windows
//! - Target aspect ratios and encoding configuration

pub mod boundary;
pub mod candidate;
pub mod encoding;
pub mod ratio;
pub mod timeline;
pub mod timestamp;
pub mod word;

// Re-export common types
pub use boundary::{normalize, DurationPolicy};
pub use candidate::{ClipCandidate, ClipWindow};
pub use encoding::EncodingConfig;
pub use ratio::{AspectRatio, AspectRatioParseError};
pub use timeline::{timeline_from_segments, TimelineItem, MIN_VISIBLE_DURATION};
pub use word::{synthesize_words, Segment, TimedWord, Transcript};
