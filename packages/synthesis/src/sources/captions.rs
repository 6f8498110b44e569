//! Third-party caption API source.
//!
//! A hosted transcript API is the most reliable strategy on cloud
//! servers, where direct caption endpoints are frequently blocked.
//! The API answers with millisecond offsets which are converted to
//! seconds here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{Transcript, TranscriptSource};
use crate::types::{ContentRef, ContentSegment, SourceKind};

const DEFAULT_BASE_URL: &str = "https://api.supadata.ai/v1/youtube";

#[derive(Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Vec<TranscriptItem>,
}

#[derive(Deserialize)]
struct TranscriptItem {
    #[serde(default)]
    text: String,
    /// Milliseconds from content start
    #[serde(default)]
    offset: f64,
    /// Milliseconds
    #[serde(default)]
    duration: f64,
}

/// Transcript source backed by a hosted caption API.
pub struct CaptionApiSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CaptionApiSource {
    /// Create a new source with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `CAPTION_API_KEY` environment variable, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("CAPTION_API_KEY").ok().map(Self::new)
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn parse_response(&self, body: TranscriptResponse) -> Transcript {
        let segments: Vec<ContentSegment> = body
            .content
            .into_iter()
            .filter(|item| !item.text.trim().is_empty())
            .map(|item| {
                let start = item.offset / 1000.0;
                ContentSegment::new(item.text.trim(), start, start + item.duration / 1000.0)
            })
            .collect();

        let mut transcript = Transcript::new(segments);
        if let Some(title) = body.title.filter(|t| !t.is_empty()) {
            transcript = transcript.with_title(title);
        }
        transcript
    }
}

#[async_trait]
impl TranscriptSource for CaptionApiSource {
    async fn fetch(&self, reference: &ContentRef) -> SourceResult<Transcript> {
        let video_id = reference
            .video_id
            .as_deref()
            .ok_or_else(|| SourceError::NotFound("reference has no video id".to_string()))?;

        let url = format!(
            "{}/transcript?url=https://www.youtube.com/watch?v={}",
            self.base_url, video_id
        );
        debug!(video_id = %video_id, "caption API fetch starting");

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
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
        if status.as_u16() == 404 {
            return Err(SourceError::NotFound(format!(
                "no transcript for video {video_id}"
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        // An empty content list with a 200 is reported as-is; the
        // cascade decides whether it means blocking.
        let transcript = self.parse_response(body);
        info!(
            video_id = %video_id,
            segments = transcript.segments.len(),
            "caption API fetch finished"
        );
        Ok(transcript)
    }

    fn supports(&self, reference: &ContentRef) -> bool {
        reference.kind == SourceKind::Video
    }

    fn name(&self) -> &str {
        "caption-api"
    }
}
