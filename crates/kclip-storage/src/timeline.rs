//! Persisted subtitle timelines.
//!
//! The first request for a clip's timeline generates it from the transcript
//! and stores it. From then on the stored copy is the source of truth: user
//! edits overwrite it and later reads never regenerate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kclip_models::{timeline_from_segments, TimelineItem};

use crate::error::StorageResult;
use crate::layout::StorageLayout;
use crate::naming::timestamp;
use crate::transcript::load_transcript;

/// Whether a timeline was read back or freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSource {
    Edit,
    Generated,
}

/// A clip timeline as served to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub source: TimelineSource,
    pub items: Vec<TimelineItem>,
}

/// Reads and writes `edits/<clip>.timeline.json`.
#[derive(Debug, Clone)]
pub struct TimelineStore {
    layout: StorageLayout,
}

impl TimelineStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Return the stored timeline, or build and store one from the transcript.
    pub async fn get_or_build(
        &self,
        clip_file: &str,
        transcript_name: &str,
        clip_start: f64,
        clip_end: f64,
    ) -> StorageResult<Timeline> {
        if let Some(items) = self.load(clip_file).await? {
            debug!(clip = %clip_file, items = items.len(), "Loaded stored timeline");
            return Ok(Timeline {
                source: TimelineSource::Edit,
                items,
            });
        }

        let transcript = load_transcript(&self.layout, transcript_name).await?;
        let items = timeline_from_segments(&transcript.segments, clip_start, clip_end);
        self.save(clip_file, &items).await?;

        info!(
            clip = %clip_file,
            transcript = %transcript_name,
            items = items.len(),
            "Generated timeline from transcript"
        );
        Ok(Timeline {
            source: TimelineSource::Generated,
            items,
        })
    }

    /// Stored timeline for a clip, if any.
    pub async fn load(&self, clip_file: &str) -> StorageResult<Option<Vec<TimelineItem>>> {
        let path = self.layout.timeline_path(clip_file)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored timeline for a clip.
    pub async fn save(&self, clip_file: &str, items: &[TimelineItem]) -> StorageResult<()> {
        let path = self.layout.timeline_path(clip_file)?;
        let json = serde_json::to_string_pretty(items)?;
        write_atomic(&path, json.as_bytes()).await
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers never
/// see a half-written timeline.
async fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, timestamp()));

    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
