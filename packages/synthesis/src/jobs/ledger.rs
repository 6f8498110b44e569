//! The job ledger: lifecycle tracking with transparent fallback.
//!
//! Wraps an optional primary store plus an always-present in-memory
//! fallback with the identical keyed interface. Every primary-store
//! error is caught and served from the fallback instead, so a
//! persistence outage degrades durability (jobs vanish on restart)
//! without breaking in-flight pipelines.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::stores::MemoryStore;
use crate::traits::store::JobStore;
use crate::types::{Job, JobUpdate};

/// Lifecycle ledger for synthesis jobs.
pub struct JobLedger {
    primary: Option<Arc<dyn JobStore>>,
    fallback: MemoryStore,
}

impl JobLedger {
    /// A ledger backed only by process-local memory.
    pub fn in_memory() -> Self {
        Self {
            primary: None,
            fallback: MemoryStore::new(),
        }
    }

    /// A ledger backed by a durable primary store, with the in-memory
    /// fallback engaged on any primary failure.
    pub fn with_primary(primary: Arc<dyn JobStore>) -> Self {
        Self {
            primary: Some(primary),
            fallback: MemoryStore::new(),
        }
    }

    /// Create a new pending job.
    pub async fn create(&self, owner_id: &str, source_ref: &str) -> Job {
        let job = Job::new(owner_id, source_ref);
        self.write(&job).await;
        info!(job_id = %job.id, owner_id = %owner_id, "job created");
        job
    }

    /// Fetch a job by id.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        if let Some(primary) = &self.primary {
            match primary.get(id).await {
                Ok(Some(job)) => return Some(job),
                // Not in the primary: it may have been created during
                // an outage, so the fallback is still consulted.
                Ok(None) => {}
                Err(e) => {
                    warn!(job_id = %id, error = %e, "primary job store read failed, checking fallback");
                }
            }
        }
        JobStore::get(&self.fallback, id).await.ok().flatten()
    }

    /// Merge a partial update into a job. Last-write-wins; absent
    /// fields are untouched.
    ///
    /// Returns `None` when the job does not exist. Updates against a
    /// terminal job, and status writes that do not advance the state
    /// machine, are logged and ignored (the current record is
    /// returned unchanged).
    pub async fn update(&self, id: Uuid, update: JobUpdate) -> Option<Job> {
        let mut job = self.get(id).await?;

        if job.status.is_terminal() {
            warn!(job_id = %id, status = ?job.status, "update ignored: job is terminal");
            return Some(job);
        }
        if let Some(next) = update.status {
            if !job.status.can_transition(next) {
                warn!(
                    job_id = %id,
                    from = ?job.status,
                    to = ?next,
                    "update ignored: invalid status transition"
                );
                return Some(job);
            }
        }

        update.apply(&mut job);
        self.write(&job).await;
        Some(job)
    }

    /// Delete jobs older than `max_age`, regardless of status, from
    /// both the primary and the fallback. Returns the number removed.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;

        let mut removed = JobStore::delete_older_than(&self.fallback, cutoff)
            .await
            .unwrap_or(0);

        if let Some(primary) = &self.primary {
            match primary.delete_older_than(cutoff).await {
                Ok(count) => removed += count,
                Err(e) => warn!(error = %e, "primary job store sweep failed"),
            }
        }

        removed
    }

    async fn write(&self, job: &Job) {
        if let Some(primary) = &self.primary {
            match primary.put(job).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "primary job store write failed, using fallback");
                }
            }
        }
        // The in-memory store cannot fail.
        let _ = JobStore::put(&self.fallback, job).await;
    }
}
