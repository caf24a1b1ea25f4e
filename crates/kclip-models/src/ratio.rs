//! Target aspect ratio definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output aspect ratios supported by the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    /// 9:16 for TikTok/Reels/Shorts
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square feed posts
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape, source framing kept
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Landscape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Subtitle canvas size (`PlayResX`, `PlayResY`).
    pub fn canvas(&self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
            AspectRatio::Landscape => (1920, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Landscape),
            other => Err(AspectRatioParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unsupported aspect ratio: {0}, expected 9:16, 1:1 or 16:9")]
pub struct AspectRatioParseError(String);
