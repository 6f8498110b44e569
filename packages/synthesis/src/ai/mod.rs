//! AI provider implementations.

mod gemini;

pub use gemini::GeminiAi;
