//! Transcript source implementations and the extraction cascade.

pub mod article;
pub mod captions;
pub mod cascade;
pub mod mock;
pub mod timedtext;

pub use article::ArticleSource;
pub use captions::CaptionApiSource;
pub use cascade::{Outcome, SourceCascade, classify};
pub use mock::ScriptedSource;
pub use timedtext::TimedTextSource;
