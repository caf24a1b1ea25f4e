//! Timeline to karaoke subtitle compilation.
//!
//! Each timeline item is split into phrases and every phrase becomes one
//! dialogue event whose words carry `\k` reveal tags. The reveal tags switch
//! a word from the primary to the secondary (highlight) color as it is
//! spoken. An optional hook is shown in an opaque box for the first seconds
//! of the clip.

use std::borrow::Cow;

use kclip_models::{synthesize_words, AspectRatio, TimedWord, TimelineItem};
use tracing::debug;

use crate::document::{sanitize_text, AssStyle, Event, SubtitleDocument};
use crate::phrase::{segment_phrases, DEFAULT_MAX_CHARS};
use crate::preset::{StylePreset, StyleRegistry};

/// How long the hook stays on screen (seconds from clip start).
pub const HOOK_DURATION_SECS: f64 = 4.0;

/// Hook font size on a 1080-wide canvas.
const HOOK_FONT_SIZE: f64 = 65.0;

/// Shrink-then-grow entry animation, applied once per phrase.
const POP_IN: &str = r"{\fscx85\fscy85\t(0,100,\fscx100\fscy100)}";

const BODY_STYLE: &str = "Default";
const HOOK_STYLE: &str = "Hook";

/// Canvas geometry for one output ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub width: u32,
    pub height: u32,
    /// Distance of captions from the bottom edge
    pub caption_margin_v: u32,
    /// Distance of the hook from the top edge
    pub hook_margin_v: u32,
    pub font_scale: f64,
}

impl CanvasLayout {
    pub fn for_ratio(ratio: AspectRatio) -> Self {
        let (width, height) = ratio.canvas();
        let (caption_margin_v, hook_margin_v, font_scale) = match ratio {
            // Clear of the platform UI at the bottom and the top bar
            AspectRatio::Portrait => (450, 350, 1.0),
            AspectRatio::Square => (150, 100, 0.9),
            AspectRatio::Landscape => (100, 80, 1.0),
        };
        Self {
            width,
            height,
            caption_margin_v,
            hook_margin_v,
            font_scale,
        }
    }

    fn scale(&self, size: f64) -> u32 {
        (size * self.font_scale) as u32
    }
}

/// Compiles timelines against a shared, read-only style registry.
#[derive(Debug, Clone, Copy)]
pub struct SubtitleCompiler<'a> {
    registry: &'a StyleRegistry,
    max_chars: usize,
}

impl<'a> SubtitleCompiler<'a> {
    pub fn new(registry: &'a StyleRegistry) -> Self {
        Self {
            registry,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Compile a clip-relative timeline into a subtitle document.
    ///
    /// Unknown style names use the registry default. Items without word
    /// timings get evenly spread synthetic words; items without any text
    /// are skipped.
    pub fn compile(
        &self,
        items: &[TimelineItem],
        style: &str,
        ratio: AspectRatio,
        hook: Option<&str>,
    ) -> SubtitleDocument {
        let preset = self.registry.get(style);
        let layout = CanvasLayout::for_ratio(ratio);

        let mut doc = SubtitleDocument::new(layout.width, layout.height);
        doc.styles.push(body_style(preset, &layout));
        doc.styles.push(hook_style(&layout));

        let hook = hook
            .map(str::trim)
            .filter(|h| !h.is_empty() && !items.is_empty());
        if let Some(hook) = hook {
            doc.events.push(Event::new(
                1,
                0.0,
                HOOK_DURATION_SECS,
                HOOK_STYLE,
                format!("  {}  ", sanitize_text(hook).to_uppercase()),
            ));
        }

        for item in items {
            let words = item_words(item);
            for phrase in segment_phrases(&words, self.max_chars) {
                doc.events.push(self.phrase_event(phrase, preset));
            }
        }

        debug!(
            style = %preset.name,
            ratio = %ratio,
            items = items.len(),
            events = doc.events.len(),
            "Compiled subtitle document"
        );
        doc
    }

    fn phrase_event(&self, phrase: &[TimedWord], preset: &StylePreset) -> Event {
        let start = phrase.first().map_or(0.0, |w| w.start);
        let end = phrase.last().map_or(start, |w| w.end).max(start);

        let body = karaoke_durations(phrase)
            .into_iter()
            .zip(phrase)
            .map(|(cs, word)| {
                let text = sanitize_text(word.text.trim());
                let text = if preset.uppercase {
                    text.to_uppercase()
                } else {
                    text
                };
                format!("{{\\k{}}}{}", cs, text)
            })
            .collect::<Vec<_>>()
            .join(" ");

        Event::new(0, start, end, BODY_STYLE, format!("{}{}", POP_IN, body))
    }
}

/// The item's own words, or synthetic ones spread across its duration.
fn item_words(item: &TimelineItem) -> Cow<'_, [TimedWord]> {
    if item.words.is_empty() {
        Cow::Owned(synthesize_words(&item.text, item.start, item.end))
    } else {
        Cow::Borrowed(&item.words)
    }
}

/// Per-word `\k` durations in centiseconds.
///
/// Offsets from the phrase start are rounded first and the tags are their
/// differences, so rounding error does not accumulate across the phrase.
/// Every tag is at least 1 so a zero-length word cannot stall the reveal.
pub(crate) fn karaoke_durations(phrase: &[TimedWord]) -> Vec<u32> {
    let Some(first) = phrase.first() else {
        return Vec::new();
    };
    let origin = first.start;
    let offset_cs = |t: f64| ((t - origin) * 100.0).round() as i64;

    let mut prev_end = origin;
    phrase
        .iter()
        .map(|word| {
            let cs = offset_cs(word.end) - offset_cs(prev_end);
            prev_end = word.end;
            cs.max(1) as u32
        })
        .collect()
}

fn body_style(preset: &StylePreset, layout: &CanvasLayout) -> AssStyle {
    AssStyle {
        name: BODY_STYLE.to_string(),
        font_name: preset.font.clone(),
        font_size: layout.scale(preset.font_size as f64),
        primary_color: preset.primary.clone(),
        secondary_color: preset.secondary.clone(),
        outline_color: preset.outline.clone(),
        back_color: preset.back.clone(),
        bold: preset.bold,
        border_style: preset.border_style,
        outline: preset.outline_width,
        shadow: preset.shadow,
        alignment: 2,
        margin_l: 50,
        margin_r: 50,
        margin_v: layout.caption_margin_v,
    }
}

/// Black text in a white opaque box, independent of the caption preset.
fn hook_style(layout: &CanvasLayout) -> AssStyle {
    AssStyle {
        name: HOOK_STYLE.to_string(),
        font_name: "Arial Black".to_string(),
        font_size: layout.scale(HOOK_FONT_SIZE),
        primary_color: "&H00000000".to_string(),
        secondary_color: "&H00000000".to_string(),
        // With border style 3 the outline color fills the box
        outline_color: "&H00FFFFFF".to_string(),
        back_color: "&H00000000".to_string(),
        bold: true,
        border_style: 3,
        outline: 5,
        shadow: 0,
        alignment: 8,
        margin_l: 50,
        margin_r: 50,
        margin_v: layout.hook_margin_v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_words() -> Vec<TimedWord> {
        vec![
            TimedWord::new("I", 0.0, 0.3),
            TimedWord::new("will", 0.3, 0.6),
            TimedWord::new("succeed", 0.6, 1.4),
        ]
    }

    fn dialogue_lines(doc: &SubtitleDocument) -> Vec<String> {
        doc.to_ass_string()
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_karaoke_tags_for_simple_phrase() {
        let registry = StyleRegistry::builtin();
        let item = TimelineItem::new(0.0, 1.4, "I will succeed").with_words(scenario_words());
        let doc = SubtitleCompiler::new(&registry).compile(
            &[item],
            "hormozi",
            AspectRatio::Portrait,
            None,
        );

        assert_eq!(
            dialogue_lines(&doc),
            vec![format!(
                "Dialogue: 0,0:00:00.00,0:00:01.40,Default,,0,0,0,,{}{{\\k30}}I {{\\k30}}WILL {{\\k80}}SUCCEED",
                POP_IN
            )]
        );
    }

    #[test]
    fn test_karaoke_durations() {
        assert_eq!(karaoke_durations(&scenario_words()), vec![30, 30, 80]);
        assert!(karaoke_durations(&[]).is_empty());
    }

    #[test]
    fn test_zero_length_and_backwards_words_get_minimum_tag() {
        let phrase = vec![
            TimedWord::new("a", 1.0, 1.0),
            TimedWord::new("b", 1.0, 0.5),
            TimedWord::new("c", 1.0, 1.5),
        ];
        assert_eq!(karaoke_durations(&phrase), vec![1, 1, 100]);
    }

    #[test]
    fn test_tag_sum_matches_phrase_duration() {
        // Off-grid timings with gaps between words
        let phrase = vec![
            TimedWord::new("one", 10.004, 10.337),
            TimedWord::new("two", 10.401, 10.666),
            TimedWord::new("three", 10.670, 11.113),
            TimedWord::new("four", 11.2, 11.999),
        ];
        let total: u32 = karaoke_durations(&phrase).iter().sum();
        let duration_cs = ((11.999 - 10.004) * 100.0_f64).round() as u32;
        assert!(total.abs_diff(duration_cs) <= 1, "{total} vs {duration_cs}");
    }

    #[test]
    fn test_preset_without_uppercase_keeps_case() {
        let registry = StyleRegistry::builtin();
        let item = TimelineItem::new(0.0, 1.4, "I will succeed").with_words(scenario_words());
        let doc = SubtitleCompiler::new(&registry).compile(&[item], "neon", AspectRatio::Portrait, None);
        assert!(dialogue_lines(&doc)[0].ends_with("{\\k30}I {\\k30}will {\\k80}succeed"));
    }

    #[test]
    fn test_pop_in_once_per_phrase() {
        let registry = StyleRegistry::builtin();
        let words: Vec<TimedWord> = (0..12)
            .map(|i| TimedWord::new("word", i as f64 * 0.5, i as f64 * 0.5 + 0.5))
            .collect();
        let item = TimelineItem::new(0.0, 6.0, "").with_words(words);
        let doc = SubtitleCompiler::new(&registry).compile(&[item], "classic", AspectRatio::Square, None);

        let lines = dialogue_lines(&doc);
        // "word word word word word" = 24 chars, a sixth would overflow
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.matches(POP_IN).count(), 1);
        }
    }

    #[test]
    fn test_hook_event() {
        let registry = StyleRegistry::builtin();
        let items = vec![TimelineItem::new(0.0, 2.0, "hello there")];
        let doc = SubtitleCompiler::new(&registry).compile(
            &items,
            "hormozi",
            AspectRatio::Portrait,
            Some("Stop {scrolling}"),
        );

        let lines = dialogue_lines(&doc);
        assert_eq!(lines[0], "Dialogue: 1,0:00:00.00,0:00:04.00,Hook,,0,0,0,,  STOP (SCROLLING)  ");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_hook_requires_items_and_text() {
        let registry = StyleRegistry::builtin();
        let compiler = SubtitleCompiler::new(&registry);

        let doc = compiler.compile(&[], "hormozi", AspectRatio::Portrait, Some("hook"));
        assert!(doc.events.is_empty());

        let items = vec![TimelineItem::new(0.0, 2.0, "hello")];
        let doc = compiler.compile(&items, "hormozi", AspectRatio::Portrait, Some("   "));
        assert!(doc.events.iter().all(|e| e.style != HOOK_STYLE));
    }

    #[test]
    fn test_synthesizes_words_for_edited_items() {
        let registry = StyleRegistry::builtin();
        let items = vec![TimelineItem::new(1.0, 2.0, "edited by hand  ")];
        let doc = SubtitleCompiler::new(&registry).compile(&items, "classic", AspectRatio::Portrait, None);

        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Dialogue: 0,0:00:01.00,0:00:02.00,Default"));
        assert!(lines[0].ends_with("{\\k33}edited {\\k34}by {\\k33}hand"));
    }

    #[test]
    fn test_degenerate_inputs_still_produce_valid_document() {
        let registry = StyleRegistry::builtin();
        let items = vec![
            TimelineItem::new(3.0, 3.0, ""),
            TimelineItem::new(5.0, 5.0, "instant"),
        ];
        let doc = SubtitleCompiler::new(&registry).compile(&items, "", AspectRatio::Landscape, None);

        let text = doc.to_ass_string();
        assert!(text.contains("[Events]"));
        assert!(text.contains("Style: Default,Arial Black,80,"));

        let lines = dialogue_lines(&doc);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            format!("Dialogue: 0,0:00:05.00,0:00:05.00,Default,,0,0,0,,{}{{\\k1}}INSTANT", POP_IN)
        );
    }

    #[test]
    fn test_header_per_ratio() {
        let registry = StyleRegistry::builtin();
        let compiler = SubtitleCompiler::new(&registry);

        let cases = [
            (AspectRatio::Portrait, "PlayResX: 1080\nPlayResY: 1920", ",80,", ",450,1", ",65,", ",350,1"),
            (AspectRatio::Square, "PlayResX: 1080\nPlayResY: 1080", ",72,", ",150,1", ",58,", ",100,1"),
            (AspectRatio::Landscape, "PlayResX: 1920\nPlayResY: 1080", ",80,", ",100,1", ",65,", ",80,1"),
        ];

        for (ratio, res, body_size, body_margin, hook_size, hook_margin) in cases {
            let text = compiler.compile(&[], "hormozi", ratio, None).to_ass_string();
            assert!(text.contains(res), "{ratio}");

            let body = text.lines().find(|l| l.starts_with("Style: Default,")).unwrap();
            assert!(body.contains(body_size) && body.ends_with(body_margin), "{body}");

            let hook = text.lines().find(|l| l.starts_with("Style: Hook,")).unwrap();
            assert!(hook.contains(hook_size) && hook.ends_with(hook_margin), "{hook}");
            assert!(hook.contains(",3,5,0,8,"), "{hook}");
        }
    }
}
