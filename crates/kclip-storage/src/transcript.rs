//! Transcript loading.

use serde::Deserialize;
use tracing::debug;

use kclip_models::{Segment, Transcript};

use crate::error::{StorageError, StorageResult};
use crate::layout::StorageLayout;

/// Accepted on-disk shapes: a bare segment list or a full document.
#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Segments(Vec<Segment>),
    Document(Transcript),
}

impl From<TranscriptFile> for Transcript {
    fn from(file: TranscriptFile) -> Self {
        match file {
            TranscriptFile::Segments(segments) => Transcript::from_segments(segments),
            TranscriptFile::Document(transcript) => transcript,
        }
    }
}

/// Parse transcript JSON in either accepted shape.
pub fn parse_transcript(json: &str) -> StorageResult<Transcript> {
    Ok(serde_json::from_str::<TranscriptFile>(json)?.into())
}

/// Load `transcripts/<name>.json`. `name` may carry `.mp4` or `.json`.
pub async fn load_transcript(layout: &StorageLayout, name: &str) -> StorageResult<Transcript> {
    let path = layout.transcript_path(name)?;
    let json = match tokio::fs::read_to_string(&path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::not_found(format!(
                "transcript {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let transcript = parse_transcript(&json)?;
    debug!(
        path = %path.display(),
        segments = transcript.segments.len(),
        "Loaded transcript"
    );
    Ok(transcript)
}
