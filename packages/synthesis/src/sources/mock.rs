//! Scripted transcript source for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{Transcript, TranscriptSource};
use crate::types::{ContentRef, SourceKind};

/// A source that replays a queue of canned outcomes, one per call.
///
/// Once the queue is drained, further calls report not-found. Tracks
/// the number of fetches for assertions.
///
/// # Example
///
/// ```rust,ignore
/// let source = ScriptedSource::new("flaky")
///     .err(SourceError::RateLimited)
///     .ok(transcript);
/// ```
pub struct ScriptedSource {
    name: String,
    outcomes: Mutex<VecDeque<SourceResult<Transcript>>>,
    fetch_count: Mutex<u32>,
    supported: Option<SourceKind>,
}

impl ScriptedSource {
    /// Create an empty scripted source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(VecDeque::new()),
            fetch_count: Mutex::new(0),
            supported: None,
        }
    }

    /// Queue a successful outcome.
    pub fn ok(self, transcript: Transcript) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(transcript));
        self
    }

    /// Queue an error outcome.
    pub fn err(self, error: SourceError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Restrict the source to article references.
    pub fn articles_only(mut self) -> Self {
        self.supported = Some(SourceKind::Article);
        self
    }

    /// Number of fetch calls made so far.
    pub fn fetch_count(&self) -> u32 {
        *self.fetch_count.lock().unwrap()
    }
}

#[async_trait]
impl TranscriptSource for ScriptedSource {
    async fn fetch(&self, _reference: &ContentRef) -> SourceResult<Transcript> {
        *self.fetch_count.lock().unwrap() += 1;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::NotFound("script exhausted".to_string())))
    }

    fn supports(&self, reference: &ContentRef) -> bool {
        match self.supported {
            Some(kind) => reference.kind == kind,
            None => true,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
