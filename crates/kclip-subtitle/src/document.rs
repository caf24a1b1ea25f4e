//! ASS (Advanced SubStation Alpha) document model.
//!
//! Only the subset needed for burned-in captions is modelled: a script info
//! block, a style table and dialogue events.

use std::fmt;
use std::path::Path;

use kclip_models::timestamp::format_ass_time;
use tracing::debug;

use crate::error::{SubtitleError, SubtitleResult};

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// One row of the `[V4+ Styles]` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// Colors in `&HAABBGGRR` format
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub bold: bool,
    /// 1 = outline + drop shadow, 3 = opaque box
    pub border_style: u8,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad layout: 1-3 bottom, 4-6 middle, 7-9 top
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl AssStyle {
    /// Format the style line for the ASS file.
    pub fn to_style_line(&self) -> String {
        let bold_val = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline},{back},{bold},0,0,0,100,100,0,0,{border},{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            secondary = self.secondary_color,
            outline = self.outline_color,
            back = self.back_color,
            bold = bold_val,
            border = self.border_style,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

/// A dialogue event. Margins and effect are left to the style.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub layer: u32,
    /// Clip-relative seconds
    pub start: f64,
    pub end: f64,
    pub style: String,
    /// Already-escaped text including override tags
    pub text: String,
}

impl Event {
    pub fn new(layer: u32, start: f64, end: f64, style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            layer,
            start,
            end,
            style: style.into(),
            text: text.into(),
        }
    }

    pub fn to_dialogue_line(&self) -> String {
        format!(
            "Dialogue: {},{},{},{},,0,0,0,,{}",
            self.layer,
            format_ass_time(self.start),
            format_ass_time(self.end),
            self.style,
            self.text
        )
    }
}

/// A complete subtitle document ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub styles: Vec<AssStyle>,
    pub events: Vec<Event>,
}

impl SubtitleDocument {
    pub fn new(play_res_x: u32, play_res_y: u32) -> Self {
        Self {
            play_res_x,
            play_res_y,
            styles: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn to_ass_string(&self) -> String {
        self.to_string()
    }

    /// Write the document as UTF-8, creating parent directories.
    pub async fn write_to(&self, path: &Path) -> SubtitleResult<()> {
        let write_err = |source| SubtitleError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(path, self.to_ass_string())
            .await
            .map_err(write_err)?;

        debug!(path = %path.display(), events = self.events.len(), "Wrote subtitle document");
        Ok(())
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Script Info]")?;
        writeln!(f, "ScriptType: v4.00+")?;
        writeln!(f, "PlayResX: {}", self.play_res_x)?;
        writeln!(f, "PlayResY: {}", self.play_res_y)?;
        writeln!(f, "ScaledBorderAndShadow: yes")?;
        writeln!(f)?;

        writeln!(f, "[V4+ Styles]")?;
        writeln!(f, "{}", STYLE_FORMAT)?;
        for style in &self.styles {
            writeln!(f, "{}", style.to_style_line())?;
        }
        writeln!(f)?;

        writeln!(f, "[Events]")?;
        writeln!(f, "{}", EVENT_FORMAT)?;
        for event in &self.events {
            writeln!(f, "{}", event.to_dialogue_line())?;
        }
        Ok(())
    }
}

/// Neutralise characters that would open override blocks or split the line.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '{' => '(',
            '}' => ')',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}
