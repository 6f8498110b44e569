//! PostgreSQL storage implementation.
//!
//! Requires the `postgres` feature. Records are stored as JSONB under
//! their key, matching the keyed get/put contract; schema management
//! beyond the bootstrap below is an external concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{JobStore, KnowledgeStore, NotesRecord, NotesRef, NotesStore};
use crate::types::{Job, KnowledgeMap};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS synthesis_jobs (
        id UUID PRIMARY KEY,
        owner_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        record JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS synthesis_notes (
        id UUID PRIMARY KEY,
        owner_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        record JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS knowledge_maps (
        owner_id TEXT PRIMARY KEY,
        updated_at TIMESTAMPTZ NOT NULL,
        map JSONB NOT NULL
    )
    "#,
];

/// PostgreSQL-backed keyed store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store from an existing pool, bootstrapping tables.
    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Backend(Box::new(other)),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl JobStore for PostgresStore {
    async fn put(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO synthesis_jobs (id, owner_id, created_at, record)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record
            "#,
        )
        .bind(job.id)
        .bind(&job.owner_id)
        .bind(job.created_at)
        .bind(encode(job)?)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT record FROM synthesis_jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(decode).transpose()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let result = sqlx::query("DELETE FROM synthesis_jobs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl NotesStore for PostgresStore {
    async fn insert(&self, record: &NotesRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO synthesis_notes (id, owner_id, created_at, record)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record
            "#,
        )
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(record.created_at)
        .bind(encode(record)?)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<NotesRecord>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT record FROM synthesis_notes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(decode).transpose()
    }

    async fn list_refs(&self, owner_id: &str) -> StoreResult<Vec<NotesRef>> {
        let rows: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT record FROM synthesis_notes WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|value| decode::<NotesRecord>(value).map(|record| record.to_ref()))
            .collect()
    }

    async fn count_for_owner(&self, owner_id: &str) -> StoreResult<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM synthesis_notes WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count as usize)
    }
}

#[async_trait]
impl KnowledgeStore for PostgresStore {
    async fn get(&self, owner_id: &str) -> StoreResult<Option<KnowledgeMap>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT map FROM knowledge_maps WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(decode).transpose()
    }

    async fn put(&self, owner_id: &str, map: &KnowledgeMap) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO knowledge_maps (owner_id, updated_at, map)
            VALUES ($1, NOW(), $2)
            ON CONFLICT (owner_id) DO UPDATE SET map = EXCLUDED.map, updated_at = NOW()
            "#,
        )
        .bind(owner_id)
        .bind(encode(map)?)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}
