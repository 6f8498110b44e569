//! Progress reporting from engines back to job tracking.

use async_trait::async_trait;

/// Receives engine progress. Engines report a fraction of their own
/// phase (0.0..=1.0); the job runner maps phases onto the job's
/// overall progress band.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, fraction: f32, stage: &str);
}

/// A sink that discards progress, for callers that do not track it.
pub struct NullProgress;

#[async_trait]
impl ProgressSink for NullProgress {
    async fn report(&self, _fraction: f32, _stage: &str) {}
}
