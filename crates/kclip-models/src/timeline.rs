//! Clip-relative subtitle timeline.
//!
//! A timeline is what the subtitle editor shows and what the compiler
//! consumes: transcript segments shifted so that `0.0` is the first frame of
//! the rendered clip.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::round_centis;
use crate::word::{shift_word, Segment, TimedWord};

/// Items shorter than this are not worth showing (seconds).
pub const MIN_VISIBLE_DURATION: f64 = 0.12;

/// One caption line in clip-relative time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineItem {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Word timings in clip-relative time; empty for hand-edited items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<TimedWord>,
}

impl TimelineItem {
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

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Build a clip-relative timeline from absolute transcript segments.
///
/// Segments that do not touch `[clip_start, clip_end]` are skipped, the rest
/// are clamped to the window and shifted so the clip starts at zero. Items
/// that end up shorter than [`MIN_VISIBLE_DURATION`] are dropped.
pub fn timeline_from_segments(
    segments: &[Segment],
    clip_start: f64,
    clip_end: f64,
) -> Vec<TimelineItem> {
    segments
        .iter()
        .filter_map(|seg| {
            let text = seg.text.trim();
            if text.is_empty() || seg.end < clip_start || seg.start > clip_end {
                return None;
            }

            let rel_start = seg.start.max(clip_start) - clip_start;
            let rel_end = seg.end.min(clip_end) - clip_start;
            if rel_end - rel_start < MIN_VISIBLE_DURATION {
                return None;
            }

            let words = seg
                .words
                .iter()
                .filter_map(|w| shift_word(w, clip_start, rel_start, rel_end))
                .collect();

            Some(
                TimelineItem::new(round_centis(rel_start), round_centis(rel_end), text)
                    .with_words(words),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(5.0, 9.0, "before the clip"),
            Segment::new(9.5, 12.0, "straddles the start"),
            Segment::new(12.0, 14.0, " inside "),
            Segment::new(14.0, 14.05, "blink"),
            Segment::new(19.0, 25.0, "straddles the end"),
            Segment::new(15.0, 16.0, "   "),
            Segment::new(30.0, 31.0, "after"),
        ]
    }

    #[test]
    fn test_shift_and_clamp() {
        let items = timeline_from_segments(&segments(), 10.0, 20.0);
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["straddles the start", "inside", "straddles the end"]);

        assert_eq!(items[0].start, 0.0);
        assert_eq!(items[0].end, 2.0);
        assert_eq!(items[1].start, 2.0);
        assert_eq!(items[2].start, 9.0);
        assert_eq!(items[2].end, 10.0);
    }

    #[test]
    fn test_words_are_shifted_and_trimmed() {
        let seg = Segment::new(9.0, 11.0, "a b c").with_words(vec![
            TimedWord::new("a", 9.0, 9.8),
            TimedWord::new("b", 9.8, 10.4),
            TimedWord::new("c", 10.4, 11.0),
        ]);
        let items = timeline_from_segments(&[seg], 10.0, 20.0);
        assert_eq!(items.len(), 1);

        let words = &items[0].words;
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], TimedWord::new("b", 0.0, 0.4));
        assert_eq!(words[1], TimedWord::new("c", 0.4, 1.0));
    }

    #[test]
    fn test_serde_round_trip() {
        let items = vec![
            TimelineItem::new(0.0, 1.25, "hello there"),
            TimelineItem::new(1.25, 3.5, "with words").with_words(vec![
                TimedWord::new("with", 1.25, 2.0),
                TimedWord::new("words", 2.0, 3.5),
            ]),
        ];
        let json = serde_json::to_string_pretty(&items).unwrap();
        let back: Vec<TimelineItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn test_editor_payload_without_words() {
        let back: Vec<TimelineItem> =
            serde_json::from_str(r#"[{"start":0.5,"end":1.5,"text":"edited"}]"#).unwrap();
        assert!(back[0].words.is_empty());
        assert_eq!(back[0].duration(), 1.0);
    }
}
