//! Local storage for the KaraokeClip backend.
//!
//! Everything lives under one root directory:
//!
//! ```text
//! <root>/uploads/            source videos
//! <root>/transcripts/        speech-to-text output (<name>.json)
//! <root>/clips/              extracted clips
//! <root>/edits/              persisted timelines (<clip>.timeline.json)
//! <root>/ass/                compiled subtitle documents
//! <root>/clips_subtitled/    final renders
//! <root>/bgm/                user background music
//! ```

pub mod error;
pub mod layout;
pub mod naming;
pub mod timeline;
pub mod transcript;

pub use error::{StorageError, StorageResult};
pub use layout::{StorageDir, StorageLayout};
pub use timeline::{Timeline, TimelineSource, TimelineStore};
pub use transcript::load_transcript;
