//! Clip candidate and clip window models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default hook when the suggestion service did not produce one.
pub const FALLBACK_HOOK: &str = "Watch this!";
/// Default reason when the suggestion service did not produce one.
pub const FALLBACK_REASON: &str = "No reason provided";
/// Default ranking score.
pub const FALLBACK_SCORE: f64 = 0.5;

/// A clip suggested by the language-model service, in source-absolute seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipCandidate {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub hook: String,
    /// Ranking score in [0, 1]; only used for ordering
    #[serde(default = "default_score")]
    pub score: f64,
}

fn default_score() -> f64 {
    FALLBACK_SCORE
}

impl ClipCandidate {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            reason: FALLBACK_REASON.to_string(),
            hook: FALLBACK_HOOK.to_string(),
            score: FALLBACK_SCORE,
        }
    }

    pub fn with_hook(mut self, hook: impl Into<String>) -> Self {
        self.hook = hook.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }
}

/// A validated clip time range in source-absolute seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the window has no renderable length.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
