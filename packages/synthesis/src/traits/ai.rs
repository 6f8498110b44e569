//! AI trait for text synthesis.
//!
//! Implementations wrap a specific LLM provider. The pipeline owns
//! prompt construction and response parsing, so the trait surface is
//! deliberately small: instructional prompt in, text out. Responses
//! may be fence-wrapped JSON or free text; callers must treat
//! malformed output as non-fatal.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Text-synthesis provider.
#[async_trait]
pub trait Ai: Send + Sync {
    /// Generate text for an instructional prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: Ai + ?Sized> Ai for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}
