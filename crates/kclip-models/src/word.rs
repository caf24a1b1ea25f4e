//! Transcript, segment and word-timing models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::round_centis;

/// Fallback video length when nothing better is known (seconds).
pub const UNKNOWN_VIDEO_LENGTH: f64 = 99_999.0;

/// Default number of segments rendered into suggestion prompts.
pub const DEFAULT_PROMPT_SEGMENTS: usize = 500;

/// A single word with its spoken time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimedWord {
    /// Word text (speech engines emit it under `word`)
    #[serde(alias = "word")]
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Display width in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A transcript segment with optional word-level timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
    /// Word timings, empty when the engine only produced segment timing
    #[serde(default, deserialize_with = "null_as_empty")]
    pub words: Vec<TimedWord>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: Vec::new(),
        }
    }

    pub fn with_words(mut self, words: Vec<TimedWord>) -> Self {
        self.words = words;
        self
    }
}

/// Speech-to-text output for one source video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Media duration reported by the speech engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    /// Render `[start - end] text` lines for the clip-suggestion service.
    pub fn to_timestamped_text(&self, max_segments: usize) -> String {
        self.segments
            .iter()
            .take(max_segments)
            .filter_map(|s| {
                let text = s.text.trim();
                (!text.is_empty()).then(|| format!("[{:.2} - {:.2}] {}", s.start, s.end, text))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Best known video length: reported duration, then last segment end.
    pub fn estimated_length(&self) -> f64 {
        let reported = || self.duration.filter(|d| d.is_finite() && *d > 0.0);
        let last_end = || self.segments.last().map(|s| s.end).filter(|e| *e > 0.0);

        reported().or_else(last_end).unwrap_or(UNKNOWN_VIDEO_LENGTH)
    }
}

/// Spread the words of `text` evenly across `[start, end)`.
///
/// Used when a segment was edited by hand or the engine produced no word
/// timings. Returns an empty list when the text has no words.
pub fn synthesize_words(text: &str, start: f64, end: f64) -> Vec<TimedWord> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let per_word = (end - start).max(0.0) / tokens.len() as f64;
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let word_start = start + per_word * i as f64;
            TimedWord::new(token, word_start, word_start + per_word)
        })
        .collect()
}

/// Shift a word into clip-relative time, clamped to `[lo, hi]`.
pub(crate) fn shift_word(word: &TimedWord, offset: f64, lo: f64, hi: f64) -> Option<TimedWord> {
    let start = (word.start - offset).clamp(lo, hi);
    let end = (word.end - offset).clamp(lo, hi);
    if word.end - offset <= lo || word.start - offset >= hi {
        return None;
    }
    Some(TimedWord::new(
        word.text.clone(),
        round_centis(start),
        round_centis(end),
    ))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TimedWord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<TimedWord>>::deserialize(deserializer)?.unwrap_or_default())
}
