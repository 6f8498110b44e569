//! Testing utilities including mock implementations.
//!
//! Useful for testing applications that use the synthesis library
//! without making real AI or network calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{Result, SynthesisError};
use crate::traits::ai::Ai;

/// A mock AI that replays scripted responses.
///
/// Responses are consumed in order; once the queue is empty the
/// default response is returned, or an error if none is set. Every
/// prompt is recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// let ai = MockAi::new()
///     .respond(r#"{"title": "First"}"#)
///     .respond(r#"{"title": "Second"}"#);
/// assert_eq!(ai.call_count(), 0);
/// ```
#[derive(Default)]
pub struct MockAi {
    responses: Arc<Mutex<VecDeque<String>>>,
    default_response: Arc<RwLock<Option<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Clone for MockAi {
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            default_response: Arc::clone(&self.default_response),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl MockAi {
    /// Create a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response (builder pattern).
    pub fn respond(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(response.into());
        self
    }

    /// Set the response returned once the queue is drained.
    pub fn with_default(self, response: impl Into<String>) -> Self {
        *self.default_response.write().unwrap() = Some(response.into());
        self
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// The prompts passed to generate, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Clear recorded calls.
    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Ai for MockAi {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.write().unwrap().push(prompt.to_string());

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(response);
        }
        if let Some(default) = self.default_response.read().unwrap().clone() {
            return Ok(default);
        }
        Err(SynthesisError::Ai("mock: no scripted response".to_string()))
    }
}
