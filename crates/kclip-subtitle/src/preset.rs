//! Caption style presets.
//!
//! Presets are plain data. The registry is built once at startup and handed
//! to the compiler by reference; unknown names resolve to [`DEFAULT_PRESET`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Preset used when a requested name is unknown.
pub const DEFAULT_PRESET: &str = "hormozi";

/// Visual parameters for body captions.
///
/// Colors are ASS `&HAABBGGRR` literals. `secondary` is the karaoke
/// highlight color a word switches to once its reveal tag elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    pub name: String,
    pub font: String,
    /// Base font size on a 1080-wide canvas
    pub font_size: u32,
    pub primary: String,
    pub secondary: String,
    pub outline: String,
    pub back: String,
    pub bold: bool,
    /// 1 = outline + shadow, 3 = opaque box
    pub border_style: u8,
    pub outline_width: u32,
    pub shadow: u32,
    pub uppercase: bool,
}

impl StylePreset {
    /// Bold white captions with a thick black outline and yellow highlight.
    pub fn hormozi() -> Self {
        Self {
            name: "hormozi".to_string(),
            font: "Arial Black".to_string(),
            font_size: 80,
            primary: "&H00FFFFFF".to_string(),
            secondary: "&H0000FFFF".to_string(),
            outline: "&H00000000".to_string(),
            back: "&H80000000".to_string(),
            bold: true,
            border_style: 1,
            outline_width: 4,
            shadow: 0,
            uppercase: true,
        }
    }

    /// White text with a magenta glow.
    pub fn neon() -> Self {
        Self {
            name: "neon".to_string(),
            font: "Arial".to_string(),
            font_size: 80,
            primary: "&H00FFFFFF".to_string(),
            secondary: "&H00FF00FF".to_string(),
            outline: "&H00FF00FF".to_string(),
            back: "&H00000000".to_string(),
            bold: true,
            border_style: 1,
            outline_width: 2,
            shadow: 0,
            uppercase: false,
        }
    }

    /// Black text on an opaque white box, active word turns red.
    pub fn boxed() -> Self {
        Self {
            name: "box".to_string(),
            font: "Verdana".to_string(),
            font_size: 70,
            primary: "&H00000000".to_string(),
            secondary: "&H000000FF".to_string(),
            outline: "&H00FFFFFF".to_string(),
            back: "&H00FFFFFF".to_string(),
            bold: true,
            border_style: 3,
            outline_width: 0,
            shadow: 0,
            uppercase: true,
        }
    }

    /// Understated subtitles with a soft shadow.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            font: "Arial".to_string(),
            font_size: 65,
            primary: "&H00FFFFFF".to_string(),
            secondary: "&H0000FFFF".to_string(),
            outline: "&H00000000".to_string(),
            back: "&H60000000".to_string(),
            bold: false,
            border_style: 1,
            outline_width: 2,
            shadow: 1,
            uppercase: false,
        }
    }
}

/// Immutable lookup of presets by name.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    presets: BTreeMap<String, StylePreset>,
    default_name: String,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleRegistry {
    /// Registry with the four built-in presets.
    pub fn builtin() -> Self {
        let presets = [
            StylePreset::hormozi(),
            StylePreset::neon(),
            StylePreset::boxed(),
            StylePreset::classic(),
        ]
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect();

        Self {
            presets,
            default_name: DEFAULT_PRESET.to_string(),
        }
    }

    /// Add or replace a preset (construction time only).
    pub fn with_preset(mut self, preset: StylePreset) -> Self {
        self.presets.insert(preset.name.clone(), preset);
        self
    }

    /// Change the fallback preset. Ignored when `name` is not registered.
    pub fn with_default(mut self, name: &str) -> Self {
        if self.presets.contains_key(name) {
            self.default_name = name.to_string();
        }
        self
    }

    /// Look up a preset, falling back to the default for unknown names.
    pub fn get(&self, name: &str) -> &StylePreset {
        self.find(name)
            .or_else(|| self.presets.get(&self.default_name))
            .unwrap_or_else(|| fallback_preset())
    }

    /// Exact lookup (case-insensitive), without fallback.
    pub fn find(&self, name: &str) -> Option<&StylePreset> {
        self.presets.get(name.trim().to_lowercase().as_str())
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Registered preset names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}

fn fallback_preset() -> &'static StylePreset {
    static FALLBACK: std::sync::OnceLock<StylePreset> = std::sync::OnceLock::new();
    FALLBACK.get_or_init(StylePreset::hormozi)
}
