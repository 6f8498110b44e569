//! Pipeline configuration.

use std::time::Duration;

/// Tunables for the synthesis pipeline.
///
/// Defaults follow the production values: content under 90 minutes is
/// synthesized in one call, longer content is chunked into 30-minute
/// windows, and knowledge maps batch 20 documents per call.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Content shorter than this (seconds) gets a single AI call
    pub single_pass_max_secs: f64,
    /// Maximum window duration (seconds) when chunking longer content
    pub chunk_max_secs: f64,
    /// Character cap for a merged overview
    pub overview_max_chars: usize,
    /// Character budget for transcript text sent in one prompt
    pub transcript_char_budget: usize,
    /// Documents per knowledge-map synthesis batch
    pub batch_size: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            single_pass_max_secs: 90.0 * 60.0,
            chunk_max_secs: 30.0 * 60.0,
            overview_max_chars: 300,
            transcript_char_budget: 200_000,
            batch_size: 20,
        }
    }
}

/// Tunables for the extraction cascade.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    /// Attempt budget per strategy
    pub max_attempts: u32,
    /// Backoff base; retry n waits `base * 2^n`
    pub backoff_base: Duration,
    /// Bounded timeout for a single fetch attempt
    pub attempt_timeout: Duration,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}
