//! Clip boundary normalization.
//!
//! Suggested clip boundaries are rough: they cut into the first word, stop on
//! the last syllable and ignore the duration rules the model was given. The
//! normalizer pads them, enforces the duration policy and keeps the result
//! inside the video. Inputs are clamped, never rejected.
//!
//! The steps run in a fixed order and the order matters for edge cases:
//! 1. asymmetric padding, each side clamped to `[0, video_length]`
//! 2. extend `end` by the deficit when shorter than `min_duration`
//! 3. truncate `end` when longer than `max_duration`
//! 4. if `end <= start`, set `end = min(video_length, start + min_duration)`
//!
//! Near the end of the video step 2 can hit the bound and leave the window
//! shorter than `min_duration`; the bound wins over the duration floor.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::ClipWindow;

/// Default lead-in before the suggested start (seconds).
pub const DEFAULT_PAD_BEFORE: f64 = 2.0;
/// Default tail after the suggested end (seconds).
pub const DEFAULT_PAD_AFTER: f64 = 1.0;

/// Duration rules applied by [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DurationPolicy {
    pub min_duration: f64,
    pub max_duration: f64,
    #[serde(default = "default_pad_before")]
    pub pad_before: f64,
    #[serde(default = "default_pad_after")]
    pub pad_after: f64,
}

fn default_pad_before() -> f64 {
    DEFAULT_PAD_BEFORE
}

fn default_pad_after() -> f64 {
    DEFAULT_PAD_AFTER
}

impl DurationPolicy {
    /// Policy with the default asymmetric padding.
    pub fn new(min_duration: f64, max_duration: f64) -> Self {
        Self {
            min_duration,
            max_duration,
            pad_before: DEFAULT_PAD_BEFORE,
            pad_after: DEFAULT_PAD_AFTER,
        }
    }

    pub fn with_padding(mut self, pad_before: f64, pad_after: f64) -> Self {
        self.pad_before = pad_before;
        self.pad_after = pad_after;
        self
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self::new(25.0, 60.0)
    }
}

/// Turn a candidate `[start, end]` into a padded, duration-bounded window.
///
/// # Examples
/// ```
/// use kclip_models::{normalize, DurationPolicy};
/// let w = normalize(100.0, 110.0, 1000.0, &DurationPolicy::new(25.0, 60.0));
/// assert_eq!((w.start, w.end), (98.0, 123.0));
/// ```
pub fn normalize(
    candidate_start: f64,
    candidate_end: f64,
    video_length: f64,
    policy: &DurationPolicy,
) -> ClipWindow {
    let video_length = video_length.max(0.0);
    let clamp = |v: f64| v.clamp(0.0, video_length);

    let start = clamp(candidate_start - policy.pad_before);
    let mut end = clamp(candidate_end + policy.pad_after);

    let duration = end - start;
    if duration < policy.min_duration {
        end = clamp(end + (policy.min_duration - duration));
    }

    if end - start > policy.max_duration {
        end = start + policy.max_duration;
    }

    if end <= start {
        end = video_length.min(start + policy.min_duration);
    }

    ClipWindow::new(start, end)
}
