//! Typed errors for the synthesis library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Each layer has its own
//! enum: `SourceError` for a single transcript-source attempt,
//! `StoreError` for persistence, and `SynthesisError` at the top.

use thiserror::Error;

/// Errors that can occur across the synthesis pipeline.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Every transcript source was exhausted without success
    #[error("all sources exhausted: {0}")]
    SourcesExhausted(String),

    /// The content reference does not exist at any source
    #[error("content not found: {0}")]
    NotFound(String),

    /// The reference could not be parsed or is of an unsupported kind
    #[error("invalid content reference: {0}")]
    InvalidReference(String),

    /// AI provider unavailable or failed
    #[error("AI service error: {0}")]
    Ai(String),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Publishing to the external workspace failed
    #[error("publish error: {0}")]
    Publish(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Errors from a single transcript-source attempt.
///
/// The cascade classifies these into retry-worthy and terminal
/// outcomes; sources themselves only describe what happened.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source signalled throttling (HTTP 429 or equivalent)
    #[error("rate limited")]
    RateLimited,

    /// The attempt did not complete within its timeout
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response arrived but could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The source demands verification a retry cannot satisfy
    #[error("verification required: {0}")]
    VerificationRequired(String),

    /// The referenced content does not exist
    #[error("content not found: {0}")]
    NotFound(String),
}

/// Errors from a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable; callers fall back to the in-memory store
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Record serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Result type alias for transcript-source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
