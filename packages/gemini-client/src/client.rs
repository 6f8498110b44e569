//! The Gemini HTTP client with retry and backoff.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{GeminiError, Result};
use crate::types::{GenerateRequest, GenerateResponse, GenerationConfig};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Client for the Gemini `generateContent` endpoint.
///
/// Retries transient failures with exponential backoff: rate limits
/// wait `2 * 2^attempt` seconds, server and network errors wait
/// `1 * 2^attempt` seconds. Other client errors fail immediately.
///
/// # Example
///
/// ```rust,ignore
/// let client = GeminiClient::new("AIza...").with_model("gemini-2.0-flash");
/// let text = client.generate("Explain borrowing in Rust").await?;
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(180))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            generation_config: GenerationConfig::default(),
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the model (default: gemini-2.0-flash).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies or regional endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the maximum number of attempts per call (default: 3).
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder().timeout(timeout).build().unwrap_or_default();
        self
    }

    /// Override the sampling configuration.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text for a prompt, retrying transient failures.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::from_prompt(prompt, self.generation_config.clone());

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            match self.generate_once(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    let wait = retry_delay(&e, attempt);
                    warn!(
                        attempt = attempt + 1,
                        max = self.max_retries,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "Gemini call failed, retrying"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GeminiError::Empty))
    }

    async fn generate_once(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, "Gemini generate starting");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: truncate(&message, 500),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        body.first_text().ok_or(GeminiError::Empty)
    }
}

/// Backoff delay for a retryable error: rate limits back off harder
/// than server or network errors.
fn retry_delay(error: &GeminiError, attempt: u32) -> Duration {
    let base = match error {
        GeminiError::Api { status: 429, .. } => 2,
        _ => 1,
    };
    Duration::from_secs(base * 2u64.pow(attempt))
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_per_attempt() {
        let rate_limited = GeminiError::Api {
            status: 429,
            message: String::new(),
        };
        assert_eq!(retry_delay(&rate_limited, 0), Duration::from_secs(2));
        assert_eq!(retry_delay(&rate_limited, 1), Duration::from_secs(4));
        assert_eq!(retry_delay(&rate_limited, 2), Duration::from_secs(8));

        let server = GeminiError::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(retry_delay(&server, 0), Duration::from_secs(1));
        assert_eq!(retry_delay(&server, 2), Duration::from_secs(4));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // Multi-byte characters must not be split.
        let s = "héllo";
        let t = truncate(s, 2);
        assert!(s.starts_with(&t));
    }

    #[test]
    fn builder_overrides_apply() {
        let client = GeminiClient::new("key")
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:9999")
            .with_max_retries(5);

        assert_eq!(client.model(), "gemini-1.5-pro");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.max_retries, 5);
    }
}
