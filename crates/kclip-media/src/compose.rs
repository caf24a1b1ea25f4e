//! Subtitle composition: crop, burn subtitles, mix background audio, encode.
//!
//! Planning is pure and produces the full FFmpeg invocation; rendering runs
//! it through the configured [`FfmpegRunner`]. Every job is independent and
//! writes to its own output path.

use std::path::{Path, PathBuf};

use kclip_models::EncodingConfig;
use tracing::info;

use crate::audio::{AudioSource, BackgroundAudioConfig};
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{background_mix_filter, build_video_filter};

const OPERATION: &str = "subtitle_burn";

/// One subtitle render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub input: PathBuf,
    pub subtitles: PathBuf,
    pub output: PathBuf,
    /// Requested ratio as sent by the client; unknown values are not cropped
    pub ratio: String,
    /// File name in the user audio store
    pub background_audio: Option<String>,
}

impl RenderJob {
    pub fn new(
        input: impl Into<PathBuf>,
        subtitles: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        ratio: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            subtitles: subtitles.into(),
            output: output.into(),
            ratio: ratio.into(),
            background_audio: None,
        }
    }

    pub fn with_background_audio(mut self, name: impl Into<String>) -> Self {
        self.background_audio = Some(name.into());
        self
    }
}

/// The FFmpeg invocation for a job plus what went into it.
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub video_filter: String,
    pub background: Option<AudioSource>,
    pub command: FfmpegCommand,
}

/// Builds and runs subtitle compositions.
#[derive(Debug, Clone)]
pub struct Compositor {
    ffmpeg: FfmpegRunner,
    audio: BackgroundAudioConfig,
    encoding: EncodingConfig,
}

impl Compositor {
    pub fn new(ffmpeg: FfmpegRunner, audio: BackgroundAudioConfig) -> Self {
        Self {
            ffmpeg,
            audio,
            encoding: EncodingConfig::for_subtitle_burn(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the filter graph and command for a job without running it.
    pub fn plan(&self, job: &RenderJob) -> MediaResult<CompositionPlan> {
        let video_filter = build_video_filter(&job.ratio, &job.subtitles)?;
        let background = self.audio.resolve(job.background_audio.as_deref());

        let cmd = FfmpegCommand::new(&job.input, &job.output);
        let cmd = match &background {
            Some(track) => cmd
                .add_input(&track.path, ["-stream_loop", "-1"])
                .filter_complex(format!(
                    "[0:v]{}[vout];{}",
                    video_filter,
                    background_mix_filter(self.audio.mix_level)
                ))
                .map("[vout]")
                .map("[aout]")
                .video_encoding(&self.encoding)
                .audio_encoding(&self.encoding),
            None => cmd
                .video_filter(video_filter.as_str())
                .map("0:v:0")
                .map("0:a?")
                .video_encoding(&self.encoding)
                .audio_codec("copy"),
        };
        let command = cmd.shortest().container(&self.encoding);

        Ok(CompositionPlan {
            video_filter,
            background,
            command,
        })
    }

    /// Render a job and return the output path.
    pub async fn render(&self, job: &RenderJob) -> MediaResult<PathBuf> {
        ensure_exists(&job.input)?;
        ensure_exists(&job.subtitles)?;
        if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let plan = self.plan(job)?;
        info!(
            input = %job.input.display(),
            output = %job.output.display(),
            ratio = %job.ratio,
            background = plan.background.is_some(),
            "Composing subtitled video"
        );

        self.ffmpeg.run(&plan.command, OPERATION).await?;
        Ok(job.output.clone())
    }
}

fn ensure_exists(path: &Path) -> MediaResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::FileNotFound(path.to_path_buf()))
    }
}
