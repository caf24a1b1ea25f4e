//! Clip extraction from a source video.

use std::path::{Path, PathBuf};
use tracing::info;

use kclip_models::{ClipWindow, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

const OPERATION: &str = "clip_extract";

/// Cut `window` out of `input` into `output`, re-encoding with `encoding`.
///
/// The seek happens before the input so FFmpeg does not decode the skipped
/// part of the source.
///
/// # Errors
/// Returns error if:
/// - The window is empty or inverted
/// - The input file doesn't exist
/// - FFmpeg fails or times out (the partial output is removed)
pub async fn render_clip(
    ffmpeg: &FfmpegRunner,
    input: &Path,
    output: &Path,
    window: ClipWindow,
    encoding: &EncodingConfig,
) -> MediaResult<PathBuf> {
    if window.is_empty() || !window.start.is_finite() || !window.end.is_finite() {
        return Err(MediaError::invalid_input(format!(
            "clip end ({:.2}) must be greater than start ({:.2})",
            window.end, window.start
        )));
    }
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        start = window.start,
        end = window.end,
        "Extracting clip"
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(window.start)
        .duration(window.duration())
        .video_encoding(encoding)
        .audio_encoding(encoding)
        .container(encoding);

    ffmpeg.run(&cmd, OPERATION).await?;
    Ok(output.to_path_buf())
}
