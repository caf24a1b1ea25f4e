//! Subtitle rendering: persisted timeline, ASS document, burned-in video.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, Instrument};

use kclip_media::{Compositor, RenderJob};
use kclip_models::{AspectRatio, TimelineItem};
use kclip_storage::layout::base_name;
use kclip_storage::naming::{ass_file_name, subtitled_file_name, timestamp};
use kclip_storage::{StorageDir, StorageError, StorageLayout, Timeline, TimelineStore};
use kclip_subtitle::{StyleRegistry, SubtitleCompiler};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

const OPERATION: &str = "render_subtitles";

/// An edited timeline to burn into a clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub clip_file: String,
    #[serde(default)]
    pub items: Vec<TimelineItem>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub ratio: Option<String>,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub background_audio: Option<String>,
}

impl RenderRequest {
    pub fn new(clip_file: impl Into<String>, items: Vec<TimelineItem>) -> Self {
        Self {
            clip_file: clip_file.into(),
            items,
            ..Self::default()
        }
    }
}

/// Files produced by a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub file: String,
    pub url: String,
    pub ass_file: String,
    pub ass_url: String,
}

/// Serves timelines and renders subtitled clips.
pub struct SubtitlePipeline {
    layout: StorageLayout,
    store: TimelineStore,
    registry: Arc<StyleRegistry>,
    compositor: Compositor,
    permits: Arc<Semaphore>,
    default_style: String,
}

impl SubtitlePipeline {
    pub fn new(
        layout: StorageLayout,
        registry: Arc<StyleRegistry>,
        compositor: Compositor,
        permits: Arc<Semaphore>,
    ) -> Self {
        let default_style = registry.default_name().to_string();
        Self {
            store: TimelineStore::new(layout.clone()),
            layout,
            registry,
            compositor,
            permits,
            default_style,
        }
    }

    pub fn with_default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = style.into();
        self
    }

    /// Timeline for a clip cut at `[clip_start, clip_end]` of the source.
    pub async fn timeline(
        &self,
        clip_file: &str,
        transcript_name: &str,
        clip_start: f64,
        clip_end: f64,
    ) -> WorkerResult<Timeline> {
        if !(clip_start.is_finite() && clip_end.is_finite()) || clip_end <= clip_start {
            return Err(WorkerError::invalid_request(format!(
                "clip end ({}) must be greater than start ({})",
                clip_end, clip_start
            )));
        }
        Ok(self
            .store
            .get_or_build(clip_file, transcript_name, clip_start, clip_end)
            .await?)
    }

    /// Persist the edited timeline and burn it into the clip.
    pub async fn render(&self, request: &RenderRequest) -> WorkerResult<RenderOutcome> {
        let logger = JobLogger::new(request.clip_file.as_str(), OPERATION);
        let span = logger.create_span();
        let result = self.render_inner(request, &logger).instrument(span).await;
        if let Err(e) = &result {
            logger.log_failure(e);
        }
        result
    }

    async fn render_inner(
        &self,
        request: &RenderRequest,
        logger: &JobLogger,
    ) -> WorkerResult<RenderOutcome> {
        let clip_name = base_name(&request.clip_file)?;
        let clip_path = self.layout.file(StorageDir::Clips, clip_name)?;
        if !clip_path.is_file() {
            return Err(StorageError::not_found(format!("clip {}", clip_path.display())).into());
        }
        logger.log_start(&format!("{} timeline items", request.items.len()));

        self.store.save(clip_name, &request.items).await?;

        let style = request
            .style
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.default_style.as_str());
        let ratio_str = request
            .ratio
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(AspectRatio::default().as_str());
        let ratio = ratio_str.parse::<AspectRatio>().unwrap_or_else(|e| {
            debug!(error = %e, "Unknown ratio, laying out subtitles for the default canvas");
            AspectRatio::default()
        });

        let document = SubtitleCompiler::new(&self.registry).compile(
            &request.items,
            style,
            ratio,
            request.hook.as_deref(),
        );

        let ts = timestamp();
        let ass_file = ass_file_name(clip_name, &ts);
        let ass_path = self.layout.file(StorageDir::Ass, &ass_file)?;
        document.write_to(&ass_path).await?;
        logger.log_progress(&format!(
            "wrote {} with {} events",
            ass_file,
            document.events.len()
        ));

        let file = subtitled_file_name(clip_name, &ts);
        let output = self.layout.file(StorageDir::ClipsSubtitled, &file)?;
        let mut job = RenderJob::new(&clip_path, &ass_path, &output, ratio_str);
        if let Some(track) = request.background_audio.as_deref().filter(|s| !s.trim().is_empty()) {
            job = job.with_background_audio(track);
        }

        {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| WorkerError::config_error("FFmpeg limiter closed"))?;
            self.compositor.render(&job).await?;
        }

        logger.log_completion(&file);
        Ok(RenderOutcome {
            url: StorageLayout::file_url(StorageDir::ClipsSubtitled, &file),
            ass_url: StorageLayout::file_url(StorageDir::Ass, &ass_file),
            file,
            ass_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kclip_media::testing::FakeRunner;
    use kclip_media::{BackgroundAudioConfig, FfmpegRunner};
    use kclip_models::TimedWord;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        layout: StorageLayout,
        fake: Arc<FakeRunner>,
        pipeline: SubtitlePipeline,
    }

    async fn fixture(fake: FakeRunner) -> Fixture {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path());
        layout.ensure_dirs().await.unwrap();
        std::fs::write(layout.dir(StorageDir::Clips).join("talk_clip.mp4"), b"clip").unwrap();
        std::fs::write(
            layout.dir(StorageDir::Transcripts).join("talk.json"),
            r#"[{"start": 100.0, "end": 101.4, "text": "I will succeed"}]"#,
        )
        .unwrap();

        let fake = Arc::new(fake);
        let audio = BackgroundAudioConfig::default()
            .with_user_dir(layout.dir(StorageDir::Bgm))
            .with_default_asset(dir.path().join("no-default.mp3"));
        let compositor = Compositor::new(FfmpegRunner::new(fake.clone()), audio);
        let pipeline = SubtitlePipeline::new(
            layout.clone(),
            Arc::new(StyleRegistry::builtin()),
            compositor,
            Arc::new(Semaphore::new(1)),
        );
        Fixture {
            _dir: dir,
            layout,
            fake,
            pipeline,
        }
    }

    fn items() -> Vec<TimelineItem> {
        vec![TimelineItem::new(0.0, 1.4, "I will succeed").with_words(vec![
            TimedWord::new("I", 0.0, 0.3),
            TimedWord::new("will", 0.3, 0.6),
            TimedWord::new("succeed", 0.6, 1.4),
        ])]
    }

    #[tokio::test]
    async fn test_render_writes_ass_and_video() {
        let f = fixture(FakeRunner::succeeding()).await;
        let mut request = RenderRequest::new("talk_clip.mp4", items());
        request.hook = Some("you won't believe it".to_string());

        let outcome = f.pipeline.render(&request).await.unwrap();

        assert!(outcome.file.starts_with("talk_clip_sub_"));
        assert_eq!(outcome.url, format!("/files/clips_subtitled/{}", outcome.file));
        assert!(outcome.ass_file.starts_with("talk_clip.mp4_"));
        assert_eq!(outcome.ass_url, format!("/files/ass/{}", outcome.ass_file));

        let ass = std::fs::read_to_string(f.layout.dir(StorageDir::Ass).join(&outcome.ass_file))
            .unwrap();
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("{\\k30}I {\\k30}WILL {\\k80}SUCCEED"));
        assert!(ass.contains("YOU WON'T BELIEVE IT"));
        assert!(f
            .layout
            .dir(StorageDir::ClipsSubtitled)
            .join(&outcome.file)
            .exists());

        let args = f.fake.last_args().join(" ");
        assert!(args.contains("crop=trunc(ih*9/16/2)*2:ih,ass="));
        assert!(args.contains("-c:a copy"));
    }

    #[tokio::test]
    async fn test_render_persists_the_edit() {
        let f = fixture(FakeRunner::succeeding()).await;
        let edited = vec![TimelineItem::new(0.0, 2.0, "hand edited")];
        f.pipeline
            .render(&RenderRequest::new("talk_clip.mp4", edited.clone()))
            .await
            .unwrap();

        let timeline = f
            .pipeline
            .timeline("talk_clip.mp4", "talk.mp4", 100.0, 125.0)
            .await
            .unwrap();
        assert_eq!(timeline.items, edited);
    }

    #[tokio::test]
    async fn test_unknown_ratio_uses_default_canvas_without_crop() {
        let f = fixture(FakeRunner::succeeding()).await;
        let mut request = RenderRequest::new("talk_clip.mp4", items());
        request.ratio = Some("4:3".to_string());
        request.style = Some("NEON".to_string());

        let outcome = f.pipeline.render(&request).await.unwrap();

        let ass = std::fs::read_to_string(f.layout.dir(StorageDir::Ass).join(&outcome.ass_file))
            .unwrap();
        assert!(ass.contains("PlayResX: 1080"));
        let args = f.fake.last_args();
        let vf = &args[args.iter().position(|a| a == "-vf").unwrap() + 1];
        assert!(vf.starts_with("ass="));
    }

    #[tokio::test]
    async fn test_background_audio_from_user_store() {
        let f = fixture(FakeRunner::succeeding()).await;
        std::fs::write(f.layout.dir(StorageDir::Bgm).join("lofi.mp3"), b"music").unwrap();
        let mut request = RenderRequest::new("talk_clip.mp4", items());
        request.background_audio = Some("lofi.mp3".to_string());

        f.pipeline.render(&request).await.unwrap();

        let args = f.fake.last_args().join(" ");
        assert!(args.contains("-stream_loop -1 -i "));
        assert!(args.contains("lofi.mp3"));
        assert!(args.contains("volume=0.15"));
    }

    #[tokio::test]
    async fn test_missing_clip_is_not_found() {
        let f = fixture(FakeRunner::succeeding()).await;
        let err = f
            .pipeline
            .render(&RenderRequest::new("ghost.mp4", items()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "not_found");
        assert!(f.fake.calls().is_empty());
        assert!(f.pipeline.store.load("ghost.mp4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_timeout_leaves_no_output() {
        let f = fixture(FakeRunner::timing_out()).await;
        let err = f
            .pipeline
            .render(&RenderRequest::new("talk_clip.mp4", items()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "timeout");
        let left = std::fs::read_dir(f.layout.dir(StorageDir::ClipsSubtitled))
            .unwrap()
            .count();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn test_timeline_generates_from_transcript() {
        let f = fixture(FakeRunner::succeeding()).await;
        let timeline = f
            .pipeline
            .timeline("talk_clip.mp4", "talk", 99.0, 124.0)
            .await
            .unwrap();

        assert_eq!(timeline.source, kclip_storage::TimelineSource::Generated);
        assert_eq!(timeline.items.len(), 1);
        assert_eq!((timeline.items[0].start, timeline.items[0].end), (1.0, 2.4));

        let err = f.pipeline.timeline("talk_clip.mp4", "talk", 5.0, 5.0).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_request_defaults() {
        let request: RenderRequest =
            serde_json::from_str(r#"{"clip_file": "a.mp4", "items": []}"#).unwrap();
        assert_eq!(request, RenderRequest::new("a.mp4", vec![]));
    }
}
