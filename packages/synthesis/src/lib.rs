//! Content Ingestion and Notes Synthesis Library
//!
//! Turns long-form content (video and article transcripts) into
//! structured notes documents, and reduces many documents into one
//! per-owner knowledge map. Built around four pieces:
//!
//! - a **job ledger** tracking asynchronous work with a transparent
//!   in-memory fallback when the primary store is down,
//! - a **source cascade** that tries transcript sources in preference
//!   order and classifies failures into retry-worthy and terminal,
//! - a **notes engine** that chunks long content into time windows,
//!   synthesizes each with an AI call, and merges the results,
//! - a **knowledge engine** that batches an owner's documents and
//!   pairwise-merges partial maps into one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use synthesis::{
//!     CaptionApiSource, GeminiAi, JobLedger, JobService, KnowledgeEngine,
//!     MemoryStore, NotesEngine, SourceCascade, TimedTextSource,
//! };
//!
//! let ai = GeminiAi::from_env()?;
//! let store = Arc::new(MemoryStore::new());
//! let cascade = SourceCascade::new(vec![
//!     Arc::new(CaptionApiSource::from_env().expect("CAPTION_API_KEY")),
//!     Arc::new(TimedTextSource::new()),
//! ]);
//!
//! let service = JobService::new(
//!     Arc::new(JobLedger::in_memory()),
//!     cascade,
//!     NotesEngine::new(ai.clone()),
//!     KnowledgeEngine::new(ai, store.clone(), store.clone()),
//!     store,
//!     None,
//! );
//!
//! let job = service.submit("owner-1", "https://youtu.be/dQw4w9WgXcQ").await?;
//! // ... poll service.poll(job.id) until terminal
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Ai, TranscriptSource, stores)
//! - [`types`] - Domain types (segments, notes, knowledge maps, jobs)
//! - [`sources`] - Transcript sources and the extraction cascade
//! - [`pipeline`] - Chunking, notes synthesis, knowledge reduction
//! - [`jobs`] - Job ledger and background runner
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "gemini")]
pub mod ai;

// Re-export core types at crate root
pub use error::{Result, SourceError, StoreError, SynthesisError};
pub use traits::{
    ai::Ai,
    publish::Publisher,
    source::{Transcript, TranscriptSource},
    store::{JobStore, KnowledgeStore, NotesRecord, NotesRef, NotesStore},
};
pub use types::{
    CascadeConfig, Concept, ContentNotes, ContentRef, ContentSegment, ContentType, Insight, Job,
    JobStatus, JobUpdate, KnowledgeMap, KnowledgeStatus, NoteSection, Quote, SourceKind,
    SynthesisConfig, TocEntry, Topic, TopicConnection, TopicFact,
};

// Re-export pipeline components
pub use pipeline::{
    KnowledgeEngine, NotesEngine, NullProgress, ProgressSink, chunk_segments, detect_content_type,
    merge_notes, parse_json, strip_code_fences, union_maps,
};

// Re-export sources and the cascade
pub use sources::{
    ArticleSource, CaptionApiSource, Outcome, ScriptedSource, SourceCascade, TimedTextSource,
    classify,
};

// Re-export jobs
pub use jobs::{JobLedger, JobService, friendly_error, spawn_retention_sweep};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

#[cfg(feature = "gemini")]
pub use ai::GeminiAi;

// Re-export testing utilities
pub use testing::MockAi;
