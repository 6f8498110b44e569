//! In-memory storage implementation.
//!
//! Serves two roles: the transparent fallback the job ledger degrades
//! to when the primary store is unavailable, and the default backend
//! for tests and development. Data is lost on restart; the retention
//! sweep is the only other thing that removes jobs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::traits::store::{JobStore, KnowledgeStore, NotesRecord, NotesRef, NotesStore};
use crate::types::{Job, KnowledgeMap};

/// In-memory keyed store for jobs, notes, and knowledge maps.
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    notes: RwLock<Vec<NotesRecord>>,
    maps: RwLock<HashMap<String, KnowledgeMap>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            notes: RwLock::new(Vec::new()),
            maps: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Number of stored notes records.
    pub fn notes_count(&self) -> usize {
        self.notes.read().unwrap().len()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.jobs.write().unwrap().clear();
        self.notes.write().unwrap().clear();
        self.maps.write().unwrap().clear();
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn put(&self, job: &Job) -> StoreResult<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().unwrap().get(&id).cloned())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut jobs = self.jobs.write().unwrap();
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at >= cutoff);
        Ok(before - jobs.len())
    }
}

#[async_trait]
impl NotesStore for MemoryStore {
    async fn insert(&self, record: &NotesRecord) -> StoreResult<()> {
        self.notes.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<NotesRecord>> {
        Ok(self
            .notes
            .read()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_refs(&self, owner_id: &str) -> StoreResult<Vec<NotesRef>> {
        Ok(self
            .notes
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.to_ref())
            .collect())
    }

    async fn count_for_owner(&self, owner_id: &str) -> StoreResult<usize> {
        Ok(self
            .notes
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .count())
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn get(&self, owner_id: &str) -> StoreResult<Option<KnowledgeMap>> {
        Ok(self.maps.read().unwrap().get(owner_id).cloned())
    }

    async fn put(&self, owner_id: &str, map: &KnowledgeMap) -> StoreResult<()> {
        self.maps
            .write()
            .unwrap()
            .insert(owner_id.to_string(), map.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentNotes;
    use chrono::Duration;

    #[tokio::test]
    async fn job_put_get_roundtrip() {
        let store = MemoryStore::new();
        let job = Job::new("owner-1", "ref");

        JobStore::put(&store, &job).await.unwrap();
        let loaded = JobStore::get(&store, job.id).await.unwrap().unwrap();
        assert_eq!(loaded, job);

        assert!(JobStore::get(&store, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_deletes_only_old_jobs() {
        let store = MemoryStore::new();
        let fresh = Job::new("owner-1", "ref");
        let mut old = Job::new("owner-1", "ref");
        old.created_at = Utc::now() - Duration::hours(48);

        JobStore::put(&store, &fresh).await.unwrap();
        JobStore::put(&store, &old).await.unwrap();

        let cutoff = Utc::now() - Duration::hours(24);
        let deleted = store.delete_older_than(cutoff).await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.job_count(), 1);
        assert!(JobStore::get(&store, fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn notes_are_scoped_by_owner() {
        let store = MemoryStore::new();
        for (owner, title) in [("a", "First"), ("a", "Second"), ("b", "Other")] {
            let record =
                NotesRecord::new(owner, "ref", ContentNotes::placeholder(title, "o"));
            NotesStore::insert(&store, &record).await.unwrap();
        }

        let refs = store.list_refs("a").await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].title, "First");
        assert_eq!(store.count_for_owner("a").await.unwrap(), 2);
        assert_eq!(store.count_for_owner("b").await.unwrap(), 1);
        assert_eq!(store.count_for_owner("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn knowledge_map_is_keyed_by_owner() {
        let store = MemoryStore::new();
        assert!(KnowledgeStore::get(&store, "a").await.unwrap().is_none());

        let map = KnowledgeMap {
            version: 2,
            source_count: 7,
            ..Default::default()
        };
        KnowledgeStore::put(&store, "a", &map).await.unwrap();

        let loaded = KnowledgeStore::get(&store, "a").await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert!(KnowledgeStore::get(&store, "b").await.unwrap().is_none());
    }
}
