//! Direct caption-track source.
//!
//! Fetches the json3 caption track for a video and the title via the
//! oembed endpoint. Free and fast when it works, but caption tracks
//! are often served empty to datacenter IPs, which is why this source
//! sits behind the hosted API in the default cascade order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{Transcript, TranscriptSource};
use crate::types::{ContentRef, ContentSegment, SourceKind};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Deserialize)]
struct TimedTextBody {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: f64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

#[derive(Deserialize)]
struct OembedBody {
    #[serde(default)]
    title: Option<String>,
}

/// Caption-track transcript source.
pub struct TimedTextSource {
    client: Client,
    base_url: String,
    /// Language codes tried in preference order
    languages: Vec<String>,
}

impl Default for TimedTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedTextSource {
    /// Create a source with default settings (English first).
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            languages: vec!["en".to_string()],
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the preferred language order.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    async fn fetch_track(&self, video_id: &str, lang: &str) -> SourceResult<Vec<ContentSegment>> {
        let url = format!(
            "{}/api/timedtext?v={}&lang={}&fmt=json3",
            self.base_url, video_id, lang
        );
        debug!(video_id = %video_id, lang = %lang, "caption track fetch");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        // The endpoint answers 200 with an empty body when no track
        // exists for the language. Report no segments and let the
        // caller move on.
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body: TimedTextBody =
            serde_json::from_str(&text).map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(parse_events(body.events))
    }

    /// Title via the oembed endpoint; best-effort.
    async fn fetch_title(&self, video_id: &str) -> Option<String> {
        let url = format!(
            "{}/oembed?url=https://www.youtube.com/watch?v={}&format=json",
            self.base_url, video_id
        );
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<OembedBody>()
                .await
                .ok()
                .and_then(|b| b.title),
            Ok(response) => {
                warn!(video_id = %video_id, status = %response.status(), "oembed lookup failed");
                None
            }
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "oembed lookup failed");
                None
            }
        }
    }
}

fn parse_events(events: Vec<TimedTextEvent>) -> Vec<ContentSegment> {
    events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|s| s.utf8.trim())
                .filter(|t| !t.is_empty() && *t != "\n")
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            let start = event.start_ms / 1000.0;
            Some(ContentSegment::new(
                text,
                start,
                start + event.duration_ms / 1000.0,
            ))
        })
        .collect()
}

#[async_trait]
impl TranscriptSource for TimedTextSource {
    async fn fetch(&self, reference: &ContentRef) -> SourceResult<Transcript> {
        let video_id = reference
            .video_id
            .as_deref()
            .ok_or_else(|| SourceError::NotFound("reference has no video id".to_string()))?;

        let mut segments = Vec::new();
        for lang in &self.languages {
            segments = self.fetch_track(video_id, lang).await?;
            if !segments.is_empty() {
                break;
            }
        }

        let mut transcript = Transcript::new(segments);
        if !transcript.is_empty() {
            if let Some(title) = self.fetch_title(video_id).await {
                transcript = transcript.with_title(title);
            }
        }
        Ok(transcript)
    }

    fn supports(&self, reference: &ContentRef) -> bool {
        reference.kind == SourceKind::Video
    }

    fn name(&self) -> &str {
        "timedtext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json3_events() {
        let body: TimedTextBody = serde_json::from_str(
            r#"{
                "events": [
                    {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "hello"}, {"utf8": " world"}]},
                    {"tStartMs": 2000, "dDurationMs": 1000, "segs": [{"utf8": "\n"}]},
                    {"tStartMs": 3000, "dDurationMs": 1500, "segs": [{"utf8": "again"}]}
                ]
            }"#,
        )
        .unwrap();

        let segments = parse_events(body.events);
        assert_eq!(segments.len(), 2, "newline-only events are dropped");
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments[0].end_time, 2.0);
        assert_eq!(segments[1].start_time, 3.0);
    }

    #[test]
    fn empty_events_are_fine() {
        let body: TimedTextBody = serde_json::from_str(r#"{"events": []}"#).unwrap();
        assert!(parse_events(body.events).is_empty());
    }
}
