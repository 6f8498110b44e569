//! Domain types for the synthesis pipeline.

pub mod config;
pub mod job;
pub mod knowledge;
pub mod notes;
pub mod reference;
pub mod segment;

pub use config::{CascadeConfig, SynthesisConfig};
pub use job::{Job, JobStatus, JobUpdate};
pub use knowledge::{KnowledgeMap, KnowledgeStatus, Topic, TopicConnection, TopicFact};
pub use notes::{
    Concept, ContentNotes, ContentType, Insight, NoteSection, Quote, TocEntry, normalize_key,
};
pub use reference::{ContentRef, SourceKind, detect_source_kind, extract_video_id};
pub use segment::{ContentSegment, flat_text, format_timestamp, total_duration};
