//! Transcript segments with timing information.

use serde::{Deserialize, Serialize};

/// One timed span of transcript text.
///
/// Times are seconds from content start. Sequences are ordered
/// ascending by `start_time`, and `end_time >= start_time`. Article
/// sources use synthetic timestamps (one minute per segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSegment {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl ContentSegment {
    /// Create a new segment.
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    /// Format the start time as `M:SS` or `H:MM:SS`.
    pub fn timestamp_str(&self) -> String {
        format_timestamp(self.start_time)
    }
}

/// Format seconds as `M:SS` or `H:MM:SS`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (mins, secs) = (total / 60, total % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Total duration of an ordered segment sequence (last segment's end).
pub fn total_duration(segments: &[ContentSegment]) -> f64 {
    segments.last().map(|s| s.end_time).unwrap_or(0.0)
}

/// Join segment texts into a single whitespace-normalized string.
pub fn flat_text(segments: &[ContentSegment]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats_minutes_and_hours() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.4), "1:05");
        assert_eq!(format_timestamp(3599.0), "59:59");
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(5025.0), "1:23:45");
    }

    #[test]
    fn total_duration_is_last_end_time() {
        let segments = vec![
            ContentSegment::new("a", 0.0, 5.0),
            ContentSegment::new("b", 5.0, 12.5),
        ];
        assert_eq!(total_duration(&segments), 12.5);
        assert_eq!(total_duration(&[]), 0.0);
    }

    #[test]
    fn flat_text_normalizes_whitespace() {
        let segments = vec![
            ContentSegment::new("hello  world", 0.0, 1.0),
            ContentSegment::new(" again ", 1.0, 2.0),
        ];
        assert_eq!(flat_text(&segments), "hello world again");
    }

    #[test]
    fn segment_round_trips() {
        let segment = ContentSegment::new("text", 1.5, 3.0);
        let json = serde_json::to_string(&segment).unwrap();
        let back: ContentSegment = serde_json::from_str(&json).unwrap();
        assert_eq!(segment, back);
    }
}
