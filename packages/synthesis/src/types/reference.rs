//! Canonical content references.
//!
//! A `ContentRef` identifies one piece of ingestible content and
//! carries the detected source kind so the cascade can pick
//! applicable transcript sources.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};

/// The kind of content a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Video,
    Article,
    Pdf,
    Podcast,
}

/// A parsed, canonical content reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    /// The URL as supplied by the caller
    pub url: String,
    /// Detected source kind
    pub kind: SourceKind,
    /// Video id, when the reference is a video URL or bare id
    pub video_id: Option<String>,
}

fn video_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})").unwrap(),
            Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]{11})").unwrap(),
        ]
    })
}

fn bare_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap())
}

const PODCAST_DOMAINS: &[&str] = &[
    "podcasts.apple.com",
    "open.spotify.com",
    "overcast.fm",
    "pocketcasts.com",
    "castro.fm",
    "anchor.fm",
];

/// Extract a video id from the common video URL formats, or accept a
/// bare 11-character id.
pub fn extract_video_id(url: &str) -> Option<String> {
    for pattern in video_id_patterns() {
        if let Some(caps) = pattern.captures(url) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }
    if bare_id_pattern().is_match(url) {
        return Some(url.to_string());
    }
    None
}

/// Detect the source kind from a URL.
pub fn detect_source_kind(url: &str) -> SourceKind {
    let lower = url.trim().to_lowercase();

    if extract_video_id(&lower).is_some() {
        return SourceKind::Video;
    }
    if lower.split('?').next().unwrap_or("").ends_with(".pdf") {
        return SourceKind::Pdf;
    }
    if PODCAST_DOMAINS.iter().any(|d| lower.contains(d)) {
        return SourceKind::Podcast;
    }
    SourceKind::Article
}

impl ContentRef {
    /// Parse a caller-supplied URL into a canonical reference.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(SynthesisError::InvalidReference("empty URL".into()));
        }

        let video_id = extract_video_id(trimmed);
        let kind = if video_id.is_some() {
            SourceKind::Video
        } else {
            // Non-video references must at least parse as URLs.
            url::Url::parse(trimmed)
                .map_err(|e| SynthesisError::InvalidReference(format!("{trimmed}: {e}")))?;
            detect_source_kind(trimmed)
        };

        Ok(Self {
            url: trimmed.to_string(),
            kind,
            video_id,
        })
    }

    /// A short display form: the video id for videos, else the URL.
    pub fn short_ref(&self) -> &str {
        self.video_id.as_deref().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_video_id_from_url_formats() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(
                extract_video_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "failed for {url}"
            );
        }
    }

    #[test]
    fn rejects_non_video_urls() {
        assert!(extract_video_id("https://example.com/blog/post").is_none());
        assert!(extract_video_id("short").is_none());
    }

    #[test]
    fn detects_source_kinds() {
        assert_eq!(
            detect_source_kind("https://youtu.be/dQw4w9WgXcQ"),
            SourceKind::Video
        );
        assert_eq!(
            detect_source_kind("https://arxiv.org/pdf/1706.03762.pdf"),
            SourceKind::Pdf
        );
        assert_eq!(
            detect_source_kind("https://example.com/paper.pdf?download=1"),
            SourceKind::Pdf
        );
        assert_eq!(
            detect_source_kind("https://open.spotify.com/episode/abc"),
            SourceKind::Podcast
        );
        assert_eq!(
            detect_source_kind("https://example.com/blog/post"),
            SourceKind::Article
        );
    }

    #[test]
    fn parse_builds_canonical_ref() {
        let reference = ContentRef::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.kind, SourceKind::Video);
        assert_eq!(reference.short_ref(), "dQw4w9WgXcQ");

        let reference = ContentRef::parse("https://example.com/post").unwrap();
        assert_eq!(reference.kind, SourceKind::Article);
        assert_eq!(reference.short_ref(), "https://example.com/post");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ContentRef::parse("").is_err());
        assert!(ContentRef::parse("not a url at all").is_err());
    }
}
