//! Error types for the Gemini client.

use thiserror::Error;

/// Result type for Gemini client operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response after retries)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response contained no candidates or no text parts
    #[error("Empty response from Gemini")]
    Empty,
}

impl GeminiError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Rate limits (429), server errors (5xx), and network failures are
    /// retryable; other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeminiError::Network(_) => true,
            GeminiError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        let err = GeminiError::Api {
            status: 429,
            message: "quota".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn server_error_is_retryable() {
        let err = GeminiError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn client_error_is_not_retryable() {
        let err = GeminiError::Api {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_retryable());

        assert!(!GeminiError::Parse("oops".into()).is_retryable());
        assert!(!GeminiError::Empty.is_retryable());
    }
}
