//! Gemini implementation of the AI trait.
//!
//! Wraps the `gemini-client` crate, which owns request mechanics,
//! retry, and backoff. Requires the `gemini` feature (on by default).

use async_trait::async_trait;
use gemini_client::GeminiClient;

use crate::error::{Result, SynthesisError};
use crate::traits::ai::Ai;

/// Gemini-backed AI provider.
#[derive(Clone)]
pub struct GeminiAi {
    client: GeminiClient,
}

impl GeminiAi {
    /// Wrap an existing client.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let client = GeminiClient::from_env()
            .map_err(|e| SynthesisError::Config(e.to_string()))?;
        Ok(Self { client })
    }

    /// The underlying client.
    pub fn client(&self) -> &GeminiClient {
        &self.client
    }
}

#[async_trait]
impl Ai for GeminiAi {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client
            .generate(prompt)
            .await
            .map_err(|e| SynthesisError::Ai(e.to_string()))
    }
}
