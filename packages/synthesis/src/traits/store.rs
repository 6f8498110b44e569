//! Storage traits for jobs, notes, and knowledge maps.
//!
//! The persistence collaborator is a keyed get/put contract, split
//! per concern so backends can implement only what they need. All
//! access is keyed by job id or owner id; there is no cross-entity
//! locking, and concurrent writers are last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{ContentNotes, Job, KnowledgeMap};

/// A persisted notes document for one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub source_ref: String,
    pub title: String,
    pub notes: ContentNotes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotesRecord {
    /// Create a record for freshly synthesized notes.
    pub fn new(owner_id: impl Into<String>, source_ref: impl Into<String>, notes: ContentNotes) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            source_ref: source_ref.into(),
            title: notes.title.clone(),
            notes,
            published_url: None,
            created_at: Utc::now(),
        }
    }

    /// Condense to the triple used as knowledge-reduction input.
    pub fn to_ref(&self) -> NotesRef {
        NotesRef {
            id: self.id.to_string(),
            title: self.title.clone(),
            source_ref: self.source_ref.clone(),
        }
    }
}

/// Condensed form of a notes record: just enough for the knowledge
/// synthesis prompt, keeping the payload small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRef {
    pub id: String,
    pub title: String,
    pub source_ref: String,
}

/// Keyed storage for jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or overwrite a job by id.
    async fn put(&self, job: &Job) -> StoreResult<()>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>>;

    /// Delete all jobs created before the cutoff, regardless of
    /// status. Returns the number deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;
}

/// Keyed storage for notes records.
#[async_trait]
pub trait NotesStore: Send + Sync {
    /// Persist a notes record.
    async fn insert(&self, record: &NotesRecord) -> StoreResult<()>;

    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> StoreResult<Option<NotesRecord>>;

    /// Condensed refs for all of an owner's records, oldest first.
    async fn list_refs(&self, owner_id: &str) -> StoreResult<Vec<NotesRef>>;

    /// Live document count for an owner (drives staleness).
    async fn count_for_owner(&self, owner_id: &str) -> StoreResult<usize>;
}

/// Keyed storage for knowledge maps, one per owner.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Fetch the owner's current map.
    async fn get(&self, owner_id: &str) -> StoreResult<Option<KnowledgeMap>>;

    /// Overwrite the owner's map. Version management belongs to the
    /// caller; this is a plain keyed write (last writer wins).
    async fn put(&self, owner_id: &str, map: &KnowledgeMap) -> StoreResult<()>;
}
