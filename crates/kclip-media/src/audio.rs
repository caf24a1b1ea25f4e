//! Background music resolution.
//!
//! A render may ask for a track from the user audio store. When that track is
//! missing the process-wide default asset is used, and when that is missing
//! too the original audio passes through untouched.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// =============================================================================
// Constants
// =============================================================================

/// Default background track in the production container.
pub const DEFAULT_BGM_PATH: &str = "/app/assets/bgm/default.mp3";

/// Development fallback paths to check.
const DEV_BGM_PATHS: &[&str] = &[
    "./assets/bgm/default.mp3",
    "../assets/bgm/default.mp3",
    "storage/bgm/default.mp3",
];

/// Default user audio store.
pub const DEFAULT_USER_AUDIO_DIR: &str = "storage/bgm";

/// Music level relative to the original track.
pub const DEFAULT_MIX_LEVEL: f32 = 0.15;

// =============================================================================
// Configuration
// =============================================================================

/// Where a resolved track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOrigin {
    /// Explicitly requested file from the user audio store
    User,
    /// Process-wide default asset
    Default,
}

/// A background track that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub path: PathBuf,
    pub origin: AudioOrigin,
}

/// Background music settings.
#[derive(Debug, Clone)]
pub struct BackgroundAudioConfig {
    /// Directory holding user-provided tracks
    pub user_dir: PathBuf,
    /// Configured default asset; `None` probes the built-in locations
    pub default_asset: Option<PathBuf>,
    /// Music volume (0.0 to 1.0)
    pub mix_level: f32,
}

impl Default for BackgroundAudioConfig {
    fn default() -> Self {
        Self {
            user_dir: PathBuf::from(DEFAULT_USER_AUDIO_DIR),
            default_asset: None,
            mix_level: DEFAULT_MIX_LEVEL,
        }
    }
}

impl BackgroundAudioConfig {
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = dir.into();
        self
    }

    pub fn with_default_asset(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_asset = Some(path.into());
        self
    }

    /// Set music volume (0.0 = silent, 1.0 = same as original).
    pub fn with_mix_level(mut self, level: f32) -> Self {
        self.mix_level = level.clamp(0.0, 1.0);
        self
    }

    /// Pick the background track for a render, if any.
    pub fn resolve(&self, requested: Option<&str>) -> Option<AudioSource> {
        let source = requested
            .and_then(|name| self.user_track(name))
            .map(|path| AudioSource {
                path,
                origin: AudioOrigin::User,
            })
            .or_else(|| {
                self.default_track().map(|path| AudioSource {
                    path,
                    origin: AudioOrigin::Default,
                })
            });

        match &source {
            Some(s) => info!(path = %s.path.display(), origin = ?s.origin, "Using background audio"),
            None => debug!("No background audio, passing original audio through"),
        }
        source
    }

    /// Requested track inside the user store. Only the file name is used so
    /// a request cannot point outside the store.
    fn user_track(&self, requested: &str) -> Option<PathBuf> {
        let name = Path::new(requested.trim()).file_name()?;
        let path = self.user_dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            warn!(path = %path.display(), "Requested background audio not found");
            None
        }
    }

    fn default_track(&self) -> Option<PathBuf> {
        match &self.default_asset {
            Some(path) => path.is_file().then(|| path.clone()),
            None => resolve_default_bgm_path(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Resolve the default track, checking dev fallbacks if the production path is missing.
fn resolve_default_bgm_path() -> Option<PathBuf> {
    std::iter::once(DEFAULT_BGM_PATH)
        .chain(DEV_BGM_PATHS.iter().copied())
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .inspect(|path| debug!(path = %path.display(), "Found default background audio"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BackgroundAudioConfig) {
        let dir = TempDir::new().unwrap();
        let config = BackgroundAudioConfig::default()
            .with_user_dir(dir.path().join("bgm"))
            .with_default_asset(dir.path().join("assets").join("default.mp3"));
        std::fs::create_dir_all(dir.path().join("bgm")).unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_requested_track_wins() {
        let (dir, config) = store();
        std::fs::write(dir.path().join("bgm").join("chill.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("assets").join("default.mp3"), b"x").unwrap();

        let source = config.resolve(Some("chill.mp3")).unwrap();
        assert_eq!(source.origin, AudioOrigin::User);
        assert!(source.path.ends_with("bgm/chill.mp3"));
    }

    #[test]
    fn test_missing_request_falls_back_to_default() {
        let (dir, config) = store();
        std::fs::write(dir.path().join("assets").join("default.mp3"), b"x").unwrap();

        let source = config.resolve(Some("gone.mp3")).unwrap();
        assert_eq!(source.origin, AudioOrigin::Default);
    }

    #[test]
    fn test_nothing_on_disk_resolves_to_none() {
        let (_dir, config) = store();
        assert_eq!(config.resolve(Some("gone.mp3")), None);
        assert_eq!(config.resolve(None), None);
    }

    #[test]
    fn test_request_cannot_escape_store() {
        let (dir, config) = store();
        std::fs::write(dir.path().join("secret.mp3"), b"x").unwrap();
        assert_eq!(config.resolve(Some("../secret.mp3")), None);
    }

    #[test]
    fn test_mix_level_clamping() {
        let config = BackgroundAudioConfig::default().with_mix_level(1.5);
        assert!((config.mix_level - 1.0).abs() < f32::EPSILON);
        assert!((BackgroundAudioConfig::default().mix_level - 0.15).abs() < f32::EPSILON);
    }
}
