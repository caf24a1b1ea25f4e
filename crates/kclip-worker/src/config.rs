//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use kclip_media::audio::DEFAULT_MIX_LEVEL;
use kclip_media::BackgroundAudioConfig;
use kclip_models::DurationPolicy;
use kclip_storage::{StorageDir, StorageLayout};
use kclip_subtitle::DEFAULT_PRESET;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of the local storage tree
    pub storage_root: PathBuf,
    /// Maximum concurrent FFmpeg processes
    pub max_ffmpeg_processes: usize,
    /// Timeout for a subtitle burn
    pub render_timeout: Duration,
    /// Timeout for a single clip extraction
    pub clip_timeout: Duration,
    /// Fixed default background track; probes the built-in locations when unset
    pub bgm_default_path: Option<PathBuf>,
    /// Background track volume
    pub bgm_mix_level: f32,
    /// Style used when a render request names none
    pub default_style: String,
    /// Clips rendered per generation request
    pub max_clips: usize,
    pub min_clip_secs: f64,
    pub max_clip_secs: f64,
    pub pad_before: f64,
    pub pad_after: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            max_ffmpeg_processes: 2,
            render_timeout: Duration::from_secs(900), // 15 minutes
            clip_timeout: Duration::from_secs(600),
            bgm_default_path: None,
            bgm_mix_level: DEFAULT_MIX_LEVEL,
            default_style: DEFAULT_PRESET.to_string(),
            max_clips: 6,
            min_clip_secs: 25.0,
            max_clip_secs: 60.0,
            pad_before: 2.0,
            pad_after: 1.0,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_root: std::env::var("KCLIP_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            max_ffmpeg_processes: env_or("KCLIP_MAX_FFMPEG", defaults.max_ffmpeg_processes).max(1),
            render_timeout: Duration::from_secs(env_or(
                "KCLIP_RENDER_TIMEOUT_SECS",
                defaults.render_timeout.as_secs(),
            )),
            clip_timeout: Duration::from_secs(env_or(
                "KCLIP_CLIP_TIMEOUT_SECS",
                defaults.clip_timeout.as_secs(),
            )),
            bgm_default_path: std::env::var("KCLIP_BGM_DEFAULT_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            bgm_mix_level: env_or("KCLIP_BGM_MIX_LEVEL", defaults.bgm_mix_level),
            default_style: std::env::var("KCLIP_DEFAULT_STYLE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_style),
            max_clips: env_or("KCLIP_MAX_CLIPS", defaults.max_clips),
            min_clip_secs: env_or("KCLIP_MIN_CLIP_SECS", defaults.min_clip_secs),
            max_clip_secs: env_or("KCLIP_MAX_CLIP_SECS", defaults.max_clip_secs),
            pad_before: env_or("KCLIP_PAD_BEFORE", defaults.pad_before),
            pad_after: env_or("KCLIP_PAD_AFTER", defaults.pad_after),
        }
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_root)
    }

    pub fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy::new(self.min_clip_secs, self.max_clip_secs)
            .with_padding(self.pad_before, self.pad_after)
    }

    /// User tracks come from `<storage>/bgm`.
    pub fn background_audio(&self) -> BackgroundAudioConfig {
        let audio = BackgroundAudioConfig::default()
            .with_user_dir(self.layout().dir(StorageDir::Bgm))
            .with_mix_level(self.bgm_mix_level);
        match &self.bgm_default_path {
            Some(path) => audio.with_default_asset(path),
            None => audio,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
