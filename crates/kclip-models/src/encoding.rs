//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Clip extraction favours turnaround; the clip is re-encoded again on burn.
pub const CLIP_PRESET: &str = "veryfast";
pub const CLIP_CRF: u8 = 23;
pub const CLIP_AUDIO_BITRATE: &str = "128k";

/// Subtitle burn produces the deliverable, so quality wins over speed.
pub const BURN_PRESET: &str = "slow";
pub const BURN_CRF: u8 = 18;
pub const BURN_AUDIO_BITRATE: &str = "192k";

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "slow")
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,

    /// Audio codec used whenever audio is re-encoded
    pub audio_codec: String,

    /// Audio bitrate
    pub audio_bitrate: String,

    /// Move the moov atom to the front so playback can start while downloading
    #[serde(default)]
    pub faststart: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self::for_subtitle_burn()
    }
}

impl EncodingConfig {
    /// Settings for cutting a clip window out of the source video.
    pub fn for_clip_extract() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: CLIP_PRESET.to_string(),
            crf: CLIP_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: CLIP_AUDIO_BITRATE.to_string(),
            faststart: false,
        }
    }

    /// Settings for the final subtitle burn.
    pub fn for_subtitle_burn() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: BURN_PRESET.to_string(),
            crf: BURN_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: BURN_AUDIO_BITRATE.to_string(),
            faststart: true,
        }
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Video codec arguments (`-c:v`, `-preset`, `-crf`).
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
        ]
    }

    /// Audio re-encode arguments (`-c:a`, `-b:a`).
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }

    /// Container flags appended after codec settings.
    pub fn container_args(&self) -> Vec<String> {
        if self.faststart {
            vec!["-movflags".to_string(), "+faststart".to_string()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burn_config_prefers_quality() {
        let config = EncodingConfig::for_subtitle_burn();
        assert_eq!(config.codec, "libx264");
        assert!(config.crf < EncodingConfig::for_clip_extract().crf);
        assert_eq!(config.container_args(), vec!["-movflags", "+faststart"]);
    }

    #[test]
    fn test_video_args() {
        let args = EncodingConfig::for_clip_extract().video_args();
        assert_eq!(args, vec!["-c:v", "libx264", "-preset", "veryfast", "-crf", "23"]);
    }

    #[test]
    fn test_clip_extract_has_no_faststart() {
        assert!(EncodingConfig::for_clip_extract().container_args().is_empty());
    }
}
