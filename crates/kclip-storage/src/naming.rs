//! Output file naming.
//!
//! Rendered files are never overwritten: every name embeds a
//! microsecond-resolution local timestamp.

use chrono::Local;
use std::path::Path;

/// Current local time as `YYYYMMDD_HHMMSS_ffffff`.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%6f").to_string()
}

/// File name without its last extension.
pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// `<stem>_<ts>_<start>-<end>.mp4` for a clip cut from `source`.
pub fn clip_file_name(source: &str, start: f64, end: f64, ts: &str) -> String {
    format!("{}_{}_{:.2}-{:.2}.mp4", file_stem(source), ts, start, end).replace(':', "_")
}

/// `<clip>_<ts>.ass`; the clip's extension is kept so the source is obvious.
pub fn ass_file_name(clip_file: &str, ts: &str) -> String {
    format!("{}_{}.ass", clip_file, ts)
}

/// `<stem>_sub_<ts>.mp4`
pub fn subtitled_file_name(clip_file: &str, ts: &str) -> String {
    format!("{}_sub_{}.mp4", file_stem(clip_file), ts)
}

/// Strip a trailing `.mp4` and then `.json` (case-insensitive).
///
/// Clients send either the upload name or the transcript file name.
pub fn normalize_transcript_name(name: &str) -> &str {
    let name = strip_suffix_ignore_case(name.trim(), ".mp4");
    strip_suffix_ignore_case(name, ".json")
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> &'a str {
    let split = name.len().saturating_sub(suffix.len());
    match (name.get(..split), name.get(split..)) {
        (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(suffix) => head,
        _ => name,
    }
}
