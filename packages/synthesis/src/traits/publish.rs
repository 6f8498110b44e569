//! Publish collaborator for pushing finished notes to an external
//! workspace.
//!
//! Invoked at most once per job, best-effort: a publish failure is
//! reported in the job result but never fails the job. Delivery is
//! at-least-once, not transactional.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::store::NotesRecord;

/// External document-workspace publisher.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a notes record; returns the external URL on success.
    async fn publish(&self, record: &NotesRecord) -> Result<String>;

    /// Publisher name for logging.
    fn name(&self) -> &str {
        "publisher"
    }
}
