//! Core trait abstractions.

pub mod ai;
pub mod publish;
pub mod source;
pub mod store;

pub use ai::Ai;
pub use publish::Publisher;
pub use source::{Transcript, TranscriptSource};
pub use store::{JobStore, KnowledgeStore, NotesRecord, NotesRef, NotesStore};
