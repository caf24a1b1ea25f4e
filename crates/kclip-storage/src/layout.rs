//! Storage directory layout and public file URLs.

use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};
use crate::naming::normalize_transcript_name;

/// Top-level storage directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDir {
    Uploads,
    Transcripts,
    Clips,
    Edits,
    Ass,
    ClipsSubtitled,
    Bgm,
}

impl StorageDir {
    pub const ALL: &'static [StorageDir] = &[
        StorageDir::Uploads,
        StorageDir::Transcripts,
        StorageDir::Clips,
        StorageDir::Edits,
        StorageDir::Ass,
        StorageDir::ClipsSubtitled,
        StorageDir::Bgm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageDir::Uploads => "uploads",
            StorageDir::Transcripts => "transcripts",
            StorageDir::Clips => "clips",
            StorageDir::Edits => "edits",
            StorageDir::Ass => "ass",
            StorageDir::ClipsSubtitled => "clips_subtitled",
            StorageDir::Bgm => "bgm",
        }
    }
}

/// Paths under a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, dir: StorageDir) -> PathBuf {
        self.root.join(dir.as_str())
    }

    /// Path of `name` inside `dir`.
    ///
    /// Only the final component of `name` is used, so client-supplied names
    /// cannot reach outside the directory.
    pub fn file(&self, dir: StorageDir, name: &str) -> StorageResult<PathBuf> {
        Ok(self.dir(dir).join(base_name(name)?))
    }

    pub fn transcript_path(&self, name: &str) -> StorageResult<PathBuf> {
        let base = base_name(name)?;
        self.file(
            StorageDir::Transcripts,
            &format!("{}.json", normalize_transcript_name(base)),
        )
    }

    /// `edits/<clip>.timeline.json`
    pub fn timeline_path(&self, clip_file: &str) -> StorageResult<PathBuf> {
        let base = base_name(clip_file)?;
        self.file(StorageDir::Edits, &format!("{}.timeline.json", base))
    }

    /// Public URL of a stored file, e.g. `/files/clips/a.mp4`.
    pub fn file_url(dir: StorageDir, name: &str) -> String {
        format!("/files/{}/{}", dir.as_str(), name)
    }

    /// Create every storage directory.
    pub async fn ensure_dirs(&self) -> StorageResult<()> {
        for dir in StorageDir::ALL {
            tokio::fs::create_dir_all(self.dir(*dir)).await?;
        }
        Ok(())
    }
}

/// Final path component of a client-supplied name.
pub fn base_name(name: &str) -> StorageResult<&str> {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StorageError::invalid_name(name))
}
