//! Pure Gemini REST API client.
//!
//! A thin, dependency-light client for the Gemini `generateContent`
//! endpoint. Handles request construction, response unwrapping, and
//! retry with exponential backoff for transient failures.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::GeminiClient;
//!
//! let client = GeminiClient::from_env()?;
//! let text = client.generate("Summarize this transcript: ...").await?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::{GeminiError, Result};
pub use types::{GenerateRequest, GenerateResponse, GenerationConfig};
