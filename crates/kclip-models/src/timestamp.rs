//! Timestamp parsing and formatting utilities.
//!
//! Subtitle documents need `H:MM:SS.cc` (centisecond) stamps while the
//! clip-suggestion service may hand back either plain seconds or clock-style
//! strings, so both directions live here.

use thiserror::Error;

/// Round seconds to two decimals (centisecond grid).
pub fn round_centis(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Format seconds as an ASS timestamp (`H:MM:SS.cc`).
///
/// Negative and non-finite inputs are clamped to zero.
///
/// # Examples
/// ```
/// use kclip_models::timestamp::format_ass_time;
/// assert_eq!(format_ass_time(0.0), "0:00:00.00");
/// assert_eq!(format_ass_time(3725.5), "1:02:05.50");
/// assert_eq!(format_ass_time(-3.0), "0:00:00.00");
/// ```
pub fn format_ass_time(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    // Work on whole centiseconds so 59.996 rolls over into the next minute
    // instead of printing "60.00".
    let total_cs = (secs * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs / 6_000) % 60;
    let seconds = (total_cs / 100) % 60;
    let centis = total_cs % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Parse `SS(.f)`, `MM:SS(.f)` or `HH:MM:SS(.f)` into seconds.
///
/// # Examples
/// ```
/// use kclip_models::timestamp::parse_seconds;
/// assert_eq!(parse_seconds("90").unwrap(), 90.0);
/// assert_eq!(parse_seconds("01:30").unwrap(), 90.0);
/// assert_eq!(parse_seconds("1:00:30.5").unwrap(), 3630.5);
/// ```
pub fn parse_seconds(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    parts.iter().try_fold(0.0, |acc, part| {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimestampError::InvalidValue(part.to_string()))?;
        if value < 0.0 || !value.is_finite() {
            return Err(TimestampError::Negative);
        }
        Ok(acc * 60.0 + value)
    })
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,
    #[error("Timestamp cannot be negative")]
    Negative,
    #[error("Invalid timestamp component: {0}")]
    InvalidValue(String),
    #[error("Invalid timestamp format '{0}'. Use SS, MM:SS or HH:MM:SS")]
    InvalidFormat(String),
}
