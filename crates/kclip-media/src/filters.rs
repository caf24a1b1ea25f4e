//! FFmpeg filter definitions for subtitle composition.

use std::path::{Path, PathBuf};

use kclip_models::AspectRatio;

use crate::error::MediaResult;

/// Centered 9:16 slice at full height. The width is rounded down to an even
/// number because libx264 rejects odd dimensions.
pub const FILTER_CROP_PORTRAIT: &str = "crop=trunc(ih*9/16/2)*2:ih";

/// Centered square at full height.
pub const FILTER_CROP_SQUARE: &str = "crop=ih:ih";

/// Crop stage for a ratio; 16:9 keeps the source framing.
pub fn crop_for_ratio(ratio: AspectRatio) -> Option<&'static str> {
    match ratio {
        AspectRatio::Portrait => Some(FILTER_CROP_PORTRAIT),
        AspectRatio::Square => Some(FILTER_CROP_SQUARE),
        AspectRatio::Landscape => None,
    }
}

/// Crop stage for a requested ratio string. Unknown ratios are not cropped.
pub fn crop_filter(ratio: &str) -> Option<&'static str> {
    ratio.parse::<AspectRatio>().ok().and_then(crop_for_ratio)
}

/// Escape a path for use inside a single-quoted filter argument.
///
/// Separators are normalised to `/` first, so the only backslashes in the
/// result are the escapes for `:` and `'`.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

fn absolute(path: &Path) -> MediaResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// `ass` filter burning the given subtitle document.
pub fn subtitle_filter(ass_path: &Path) -> MediaResult<String> {
    Ok(format!("ass='{}'", escape_filter_path(&absolute(ass_path)?)))
}

/// Video chain: optional crop, then subtitle burn.
pub fn build_video_filter(ratio: &str, ass_path: &Path) -> MediaResult<String> {
    let burn = subtitle_filter(ass_path)?;
    Ok(match crop_filter(ratio) {
        Some(crop) => format!("{},{}", crop, burn),
        None => burn,
    })
}

/// Mix a looped, attenuated music track (input 1) under the original audio
/// (input 0). The original track decides the length; `aresample` fills gaps
/// in it so the mix does not stall.
pub fn background_mix_filter(mix_level: f32) -> String {
    format!(
        "[0:a]aresample=async=1:first_pts=0[a0];[1:a]volume={:.2}[bgm];[a0][bgm]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[aout]",
        mix_level
    )
}
