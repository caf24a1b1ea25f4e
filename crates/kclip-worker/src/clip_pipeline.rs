//! Clip generation: transcript, suggestions, normalized windows, rendered clips.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::Instrument;

use kclip_media::{render_clip, FfmpegRunner};
use kclip_models::word::DEFAULT_PROMPT_SEGMENTS;
use kclip_models::{normalize, ClipCandidate, ClipWindow, DurationPolicy, EncodingConfig};
use kclip_storage::naming::{clip_file_name, timestamp};
use kclip_storage::{load_transcript, StorageDir, StorageError, StorageLayout};

use crate::candidates::{suggest_candidates, ClipSuggester};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

const OPERATION: &str = "generate_clips";

/// Per-request generation options.
#[derive(Debug, Clone, Copy)]
pub struct ClipOptions {
    pub max_clips: usize,
    pub policy: DurationPolicy,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            max_clips: 6,
            policy: DurationPolicy::default(),
        }
    }
}

/// A rendered clip with the suggestion it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedClip {
    #[serde(flatten)]
    pub candidate: ClipCandidate,
    pub window: ClipWindow,
    pub file: String,
    pub url: String,
}

/// Generates clips from an uploaded video.
pub struct ClipPipeline {
    layout: StorageLayout,
    ffmpeg: FfmpegRunner,
    permits: Arc<Semaphore>,
    suggester: Arc<dyn ClipSuggester>,
    encoding: EncodingConfig,
}

impl ClipPipeline {
    /// `permits` bounds concurrent FFmpeg processes and may be shared with
    /// other pipelines.
    pub fn new(
        layout: StorageLayout,
        ffmpeg: FfmpegRunner,
        permits: Arc<Semaphore>,
        suggester: Arc<dyn ClipSuggester>,
    ) -> Self {
        Self {
            layout,
            ffmpeg,
            permits,
            suggester,
            encoding: EncodingConfig::for_clip_extract(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Suggest, normalize and render clips for `video_file` in `uploads/`.
    ///
    /// Clips come back in ranking order. Windows that normalize to nothing
    /// (a suggestion past the end of the video) are skipped.
    pub async fn generate(
        &self,
        video_file: &str,
        options: ClipOptions,
    ) -> WorkerResult<Vec<GeneratedClip>> {
        let logger = JobLogger::new(video_file, OPERATION);
        let span = logger.create_span();
        let result = self.generate_inner(video_file, options, &logger).instrument(span).await;
        if let Err(e) = &result {
            logger.log_failure(e);
        }
        result
    }

    async fn generate_inner(
        &self,
        video_file: &str,
        options: ClipOptions,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<GeneratedClip>> {
        logger.log_start(&format!("max_clips={}", options.max_clips));

        let source = self.layout.file(StorageDir::Uploads, video_file)?;
        if !source.is_file() {
            return Err(StorageError::not_found(format!("video {}", source.display())).into());
        }

        let transcript = load_transcript(&self.layout, video_file).await?;
        let video_length = transcript.estimated_length();
        let text = transcript.to_timestamped_text(DEFAULT_PROMPT_SEGMENTS);

        let candidates = suggest_candidates(
            self.suggester.as_ref(),
            &text,
            &options.policy,
            options.max_clips,
        )
        .await?;
        if candidates.is_empty() {
            return Err(WorkerError::suggestion("model suggested no clips"));
        }
        logger.log_progress(&format!("{} suggestions", candidates.len()));

        let picks: Vec<(ClipCandidate, ClipWindow)> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let window =
                    normalize(candidate.start, candidate.end, video_length, &options.policy);
                if window.is_empty() {
                    logger.log_warning(&format!(
                        "skipping suggestion {:.2}-{:.2}: empty after normalization (video length {:.2})",
                        candidate.start, candidate.end, video_length
                    ));
                    return None;
                }
                Some((candidate, window))
            })
            .take(options.max_clips)
            .collect();

        let clips = try_join_all(
            picks
                .into_iter()
                .map(|(candidate, window)| self.render_one(video_file, candidate, window)),
        )
        .await?;

        logger.log_completion(&format!("{} clips rendered", clips.len()));
        Ok(clips)
    }

    async fn render_one(
        &self,
        video_file: &str,
        candidate: ClipCandidate,
        window: ClipWindow,
    ) -> WorkerResult<GeneratedClip> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WorkerError::config_error("FFmpeg limiter closed"))?;

        let source = self.layout.file(StorageDir::Uploads, video_file)?;
        let file = clip_file_name(video_file, window.start, window.end, &timestamp());
        let output = self.layout.file(StorageDir::Clips, &file)?;

        render_clip(&self.ffmpeg, &source, &output, window, &self.encoding).await?;

        Ok(GeneratedClip {
            candidate,
            window,
            url: StorageLayout::file_url(StorageDir::Clips, &file),
            file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::StaticSuggester;
    use kclip_media::testing::FakeRunner;
    use tempfile::TempDir;

    async fn storage(transcript: &str) -> (TempDir, StorageLayout) {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure_dirs().await.unwrap();
        std::fs::write(layout.dir(StorageDir::Uploads).join("talk.mp4"), b"video").unwrap();
        std::fs::write(layout.dir(StorageDir::Transcripts).join("talk.json"), transcript).unwrap();
        (dir, layout)
    }

    fn pipeline(layout: StorageLayout, fake: Arc<FakeRunner>, model_output: &str) -> ClipPipeline {
        ClipPipeline::new(
            layout,
            FfmpegRunner::new(fake),
            Arc::new(Semaphore::new(2)),
            Arc::new(StaticSuggester::new(model_output)),
        )
    }

    const TRANSCRIPT: &str = r#"{"duration": 300.0, "segments": [
        {"start": 0.0, "end": 300.0, "text": "a long talk"}
    ]}"#;

    #[tokio::test]
    async fn test_generates_ranked_normalized_clips() {
        let (_dir, layout) = storage(TRANSCRIPT).await;
        let fake = Arc::new(FakeRunner::succeeding());
        let pipeline = pipeline(
            layout.clone(),
            fake.clone(),
            r#"[{"start": 100, "end": 122, "hook": "Low", "score": 0.4},
                {"start": 10, "end": 200, "hook": "High", "score": 0.9}]"#,
        );

        let clips = pipeline.generate("talk.mp4", ClipOptions::default()).await.unwrap();

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].candidate.hook, "High");
        assert_eq!(clips[0].window, ClipWindow::new(8.0, 68.0));
        assert_eq!(clips[1].window, ClipWindow::new(98.0, 123.0));
        assert!(clips[1].file.starts_with("talk_"));
        assert!(clips[1].file.ends_with("_98.00-123.00.mp4"));
        assert_eq!(clips[1].url, format!("/files/clips/{}", clips[1].file));
        assert!(layout.dir(StorageDir::Clips).join(&clips[0].file).exists());
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_skips_windows_past_the_end_and_caps_count() {
        let (_dir, layout) = storage(TRANSCRIPT).await;
        let fake = Arc::new(FakeRunner::succeeding());
        let pipeline = pipeline(
            layout,
            fake.clone(),
            r#"[{"start": 1000, "end": 1030, "score": 1.0},
                {"start": 10, "end": 40, "score": 0.9},
                {"start": 50, "end": 80, "score": 0.8},
                {"start": 90, "end": 120, "score": 0.7}]"#,
        );

        let clips = pipeline
            .generate(
                "talk.mp4",
                ClipOptions {
                    max_clips: 2,
                    ..ClipOptions::default()
                },
            )
            .await
            .unwrap();

        let starts: Vec<f64> = clips.iter().map(|c| c.candidate.start).collect();
        assert_eq!(starts, vec![10.0, 50.0]);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_no_suggestions_is_an_error() {
        let (_dir, layout) = storage(TRANSCRIPT).await;
        let fake = Arc::new(FakeRunner::succeeding());
        let err = pipeline(layout, fake.clone(), "[]")
            .generate("talk.mp4", ClipOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "suggestion");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_upload() {
        let (_dir, layout) = storage(TRANSCRIPT).await;
        let err = pipeline(layout, Arc::new(FakeRunner::succeeding()), "[]")
            .generate("other.mp4", ClipOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_render_failure_propagates() {
        let (_dir, layout) = storage(TRANSCRIPT).await;
        let fake = Arc::new(FakeRunner::failing(1, "Invalid data found when processing input"));
        let err = pipeline(layout.clone(), fake, r#"[{"start": 10, "end": 40}]"#)
            .generate("talk.mp4", ClipOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "process_failed");
        assert!(err.to_string().contains("Invalid data found"));
        assert_eq!(std::fs::read_dir(layout.dir(StorageDir::Clips)).unwrap().count(), 0);
    }
}
