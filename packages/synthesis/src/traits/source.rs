//! Transcript source trait for pluggable content extraction.
//!
//! A source is one interchangeable way of turning a content reference
//! into timed segments. Sources are tried in a fixed preference order
//! by the cascade; each one only reports what happened via
//! `SourceError` and leaves retry policy to the caller.

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::types::{ContentRef, ContentSegment};

/// An extracted transcript: ordered segments plus an optional title.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<ContentSegment>,
    pub title: Option<String>,
}

impl Transcript {
    /// Create a transcript from segments.
    pub fn new(segments: Vec<ContentSegment>) -> Self {
        Self {
            segments,
            title: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// A nominally-successful response with no content. The cascade
    /// watches for these: one is retried, two in a row are treated as
    /// silent blocking.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }

    /// Total duration in seconds (last segment's end time).
    pub fn total_duration(&self) -> f64 {
        crate::types::total_duration(&self.segments)
    }
}

/// One interchangeable transcript-extraction strategy.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Attempt to fetch the transcript for a reference.
    ///
    /// An `Ok` transcript with no segments is a valid outcome and
    /// means the source answered successfully but had no content.
    async fn fetch(&self, reference: &ContentRef) -> SourceResult<Transcript>;

    /// Whether this source can handle the given reference at all.
    /// Unsupported sources are skipped by the cascade without
    /// consuming any attempt budget.
    fn supports(&self, reference: &ContentRef) -> bool;

    /// Source name for logging.
    fn name(&self) -> &str;
}
