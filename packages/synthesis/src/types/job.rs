//! Job model for background synthesis work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a synthesis job.
///
/// Status only advances `Pending → Processing → {Complete, Failed}`;
/// the terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    /// Whether this status permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Same-state writes are allowed (idempotent updates); anything
    /// out of a terminal state or backwards is not.
    pub fn can_transition(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            JobStatus::Pending => true,
            JobStatus::Processing => next.is_terminal(),
            JobStatus::Complete | JobStatus::Failed => false,
        }
    }
}

/// A tracked unit of asynchronous synthesis work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub source_ref: String,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    /// Human-readable description of the current stage
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(owner_id: impl Into<String>, source_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            source_ref: source_ref.into(),
            status: JobStatus::Pending,
            progress: 0,
            stage: "queued".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a job; absent fields are left unchanged.
/// Merges are last-write-wins with no concurrency check.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub stage: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// An update that only moves progress and stage.
    pub fn progress(progress: u8, stage: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            stage: Some(stage.into()),
            ..Default::default()
        }
    }

    /// An update that marks the job complete with a result payload.
    pub fn complete(result: serde_json::Value) -> Self {
        Self {
            status: Some(JobStatus::Complete),
            progress: Some(100),
            stage: Some("Complete".to_string()),
            result: Some(result),
            ..Default::default()
        }
    }

    /// An update that marks the job failed with a friendly message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            stage: Some("Failed".to_string()),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Apply this update to a job in place, bumping `updated_at`.
    pub fn apply(&self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(progress) = self.progress {
            job.progress = progress.min(100);
        }
        if let Some(ref stage) = self.stage {
            job.stage = stage.clone();
        }
        if let Some(ref result) = self.result {
            job.result = Some(result.clone());
        }
        if let Some(ref error) = self.error {
            job.error = Some(error.clone());
        }
        job.updated_at = Utc::now();
    }
}
