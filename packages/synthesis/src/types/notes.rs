//! Structured notes produced by the synthesis pipeline.
//!
//! The wire shape (camelCase, loose item schemas with optional fields)
//! is shared between the AI output contract and persisted records, so
//! notes round-trip value-equal through JSON.

use serde::{Deserialize, Serialize};

/// Content category, used to specialize synthesis prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Lecture,
    Interview,
    Tutorial,
    Documentary,
    Article,
    Paper,
    Podcast,
    #[default]
    General,
}

impl ContentType {
    /// Lowercase label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Lecture => "lecture",
            ContentType::Interview => "interview",
            ContentType::Tutorial => "tutorial",
            ContentType::Documentary => "documentary",
            ContentType::Article => "article",
            ContentType::Paper => "paper",
            ContentType::Podcast => "podcast",
            ContentType::General => "general",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A concept with its definition and examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub concept: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// A key insight with optional context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A detailed-notes section with bullet points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSection {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub points: Vec<String>,
}

/// A notable quote with optional attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Comprehensive structured notes for one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNotes {
    pub title: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
    #[serde(default)]
    pub main_concepts: Vec<Concept>,
    #[serde(default)]
    pub key_insights: Vec<Insight>,
    #[serde(default)]
    pub detailed_notes: Vec<NoteSection>,
    #[serde(default)]
    pub notable_quotes: Vec<Quote>,
    #[serde(default)]
    pub resources_mentioned: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub questions_raised: Vec<String>,
}

impl ContentNotes {
    /// Placeholder notes carrying only a title and an explanatory
    /// overview. Used for empty transcripts and unrecoverable parse
    /// failures so a job never dies on malformed AI output.
    pub fn placeholder(title: impl Into<String>, overview: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_type: ContentType::General,
            overview: overview.into(),
            table_of_contents: Vec::new(),
            main_concepts: Vec::new(),
            key_insights: Vec::new(),
            detailed_notes: Vec::new(),
            notable_quotes: Vec::new(),
            resources_mentioned: Vec::new(),
            action_items: Vec::new(),
            questions_raised: Vec::new(),
        }
    }
}

/// Normalize free text into a dedup key: lowercased, whitespace
/// collapsed. List merges have no natural primary key, so this is it.
pub fn normalize_key(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_notes() -> ContentNotes {
        ContentNotes {
            title: "Ownership in Rust".into(),
            content_type: ContentType::Lecture,
            overview: "A lecture on move semantics and borrowing.".into(),
            table_of_contents: vec![TocEntry {
                section: "Borrowing".into(),
                timestamp: Some("5:30".into()),
                description: None,
            }],
            main_concepts: vec![Concept {
                concept: "Move semantics".into(),
                definition: "Values have a single owner.".into(),
                timestamp: Some("1:10".into()),
                examples: vec!["let b = a;".into()],
            }],
            key_insights: vec![Insight {
                insight: "The borrow checker is a compile-time discipline.".into(),
                timestamp: None,
                context: Some("No runtime cost.".into()),
            }],
            detailed_notes: vec![NoteSection {
                section: "Lifetimes".into(),
                timestamp: Some("22:00".into()),
                points: vec!["Lifetimes name regions".into()],
            }],
            notable_quotes: vec![Quote {
                quote: "Shared XOR mutable.".into(),
                speaker: Some("Instructor".into()),
                timestamp: Some("12:01".into()),
            }],
            resources_mentioned: vec!["The Rust Book".into()],
            action_items: vec!["Re-read chapter 4".into()],
            questions_raised: vec!["When do lifetimes need names?".into()],
        }
    }

    #[test]
    fn notes_round_trip_value_equal() {
        let notes = sample_notes();
        let json = serde_json::to_string(&notes).unwrap();
        let back: ContentNotes = serde_json::from_str(&json).unwrap();
        assert_eq!(notes, back);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(sample_notes()).unwrap();
        assert!(json.get("tableOfContents").is_some());
        assert!(json.get("mainConcepts").is_some());
        assert!(json.get("keyInsights").is_some());
        assert_eq!(json["contentType"], "lecture");
    }

    #[test]
    fn parses_sparse_ai_output() {
        // The AI contract is loose: missing list fields default empty.
        let notes: ContentNotes =
            serde_json::from_str(r#"{"title": "T", "overview": "O"}"#).unwrap();
        assert_eq!(notes.title, "T");
        assert_eq!(notes.content_type, ContentType::General);
        assert!(notes.key_insights.is_empty());
    }

    #[test]
    fn normalize_key_collapses_case_and_whitespace() {
        assert_eq!(
            normalize_key("  The Borrow\tChecker  "),
            "the borrow checker"
        );
        assert_eq!(normalize_key("same"), normalize_key("SAME"));
    }
}
