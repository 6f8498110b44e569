//! The chunk-and-synthesize engine.
//!
//! Converts an ordered segment sequence into one `ContentNotes`
//! document. Content that fits in a single AI call is synthesized
//! directly; longer content is chunked into time windows, synthesized
//! per window, and merged with order-preserving deduplication.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::chunk::chunk_segments;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{notes_prompt, plain_notes_prompt};
use crate::pipeline::response::parse_json;
use crate::traits::ai::Ai;
use crate::types::{
    ContentNotes, ContentSegment, ContentType, Insight, SynthesisConfig, flat_text, normalize_key,
    total_duration,
};

const FALLBACK_TITLE: &str = "Content Notes";

// Per-field caps applied when merging window results.
const CAP_TOC: usize = 15;
const CAP_CONCEPTS: usize = 15;
const CAP_INSIGHTS: usize = 25;
const CAP_DETAILED: usize = 12;
const CAP_QUOTES: usize = 12;
const CAP_RESOURCES: usize = 15;
const CAP_ACTIONS: usize = 10;
const CAP_QUESTIONS: usize = 8;

/// Detect the content category from the transcript head and title.
///
/// Pure keyword heuristics; ambiguous content falls back to the
/// caller-supplied default (typically derived from the source kind).
pub fn detect_content_type(transcript: &str, title: &str, default: ContentType) -> ContentType {
    let head: String = transcript.chars().take(5000).collect::<String>().to_lowercase();
    let title = title.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| head.contains(p) || title.contains(p));

    if matches(&[
        "step by step",
        "how to",
        "tutorial",
        "let me show you",
        "follow along",
        "let's build",
        "walkthrough",
    ]) {
        return ContentType::Tutorial;
    }
    if matches(&["podcast", "welcome back to the show", "this episode"]) {
        return ContentType::Podcast;
    }
    if matches(&[
        "interview",
        "my guest today",
        "welcome to the show",
        "thanks for having me",
        "conversation with",
        "q&a",
    ]) {
        return ContentType::Interview;
    }
    if matches(&[
        "lecture",
        "lesson",
        "today we'll learn",
        "professor",
        "let's examine",
        "as we discussed",
        "university",
        "curriculum",
    ]) {
        return ContentType::Lecture;
    }
    if matches(&[
        "documentary",
        "the story of",
        "history of",
        "investigation",
        "the truth about",
        "untold story",
    ]) {
        return ContentType::Documentary;
    }
    if matches(&["abstract", "in this paper", "we propose", "related work", "our results show"]) {
        return ContentType::Paper;
    }
    default
}

/// The chunk-and-synthesize engine.
pub struct NotesEngine<A: Ai> {
    ai: A,
    config: SynthesisConfig,
}

impl<A: Ai> NotesEngine<A> {
    /// Create an engine with default thresholds.
    pub fn new(ai: A) -> Self {
        Self {
            ai,
            config: SynthesisConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(ai: A, config: SynthesisConfig) -> Self {
        Self { ai, config }
    }

    /// Synthesize notes for a segment sequence.
    ///
    /// `default_type` seeds content-type detection (callers derive it
    /// from the source kind). AI transport failures propagate;
    /// malformed AI output degrades and never fails the call.
    pub async fn synthesize(
        &self,
        segments: &[ContentSegment],
        title: Option<&str>,
        default_type: ContentType,
        progress: &dyn ProgressSink,
    ) -> Result<ContentNotes> {
        if segments.is_empty() {
            return Ok(ContentNotes::placeholder(
                title.unwrap_or(FALLBACK_TITLE),
                "No transcript available",
            ));
        }

        let duration = total_duration(segments);
        if duration < self.config.single_pass_max_secs {
            debug!(duration_secs = duration, "single-pass synthesis");
            let notes = self
                .synthesize_window(segments, title, default_type, None)
                .await?;
            return Ok(restore_title(notes, title));
        }

        let windows = chunk_segments(segments, self.config.chunk_max_secs);
        let total = windows.len();
        info!(
            duration_secs = duration,
            windows = total,
            "long content, chunked synthesis"
        );

        let mut partials = Vec::with_capacity(total);
        for (index, window) in windows.iter().enumerate() {
            progress
                .report(
                    index as f32 / total as f32,
                    &format!("Synthesizing part {}/{}", index + 1, total),
                )
                .await;
            let notes = self
                .synthesize_window(window, title, default_type, Some((index + 1, total)))
                .await?;
            partials.push(notes);
        }
        progress.report(1.0, "Combining notes").await;

        Ok(merge_notes(partials, title, &self.config))
    }

    /// One AI call over one window, with a single degraded retry when
    /// the response fails to parse.
    async fn synthesize_window(
        &self,
        segments: &[ContentSegment],
        title: Option<&str>,
        default_type: ContentType,
        part: Option<(usize, usize)>,
    ) -> Result<ContentNotes> {
        let flat = flat_text(segments);
        let content_type = detect_content_type(&flat, title.unwrap_or(""), default_type);

        let prompt = notes_prompt(
            segments,
            content_type,
            part,
            self.config.transcript_char_budget,
        );
        let raw = self.ai.generate(&prompt).await?;

        let parse_error = match self.parse_notes(&raw, content_type, part) {
            Ok(notes) => return Ok(notes),
            Err(e) => e,
        };

        warn!(error = %parse_error, "notes response failed to parse, retrying in plain mode");
        let retry_prompt =
            plain_notes_prompt(&flat, content_type, self.config.transcript_char_budget);
        let raw = self.ai.generate(&retry_prompt).await?;

        match self.parse_notes(&raw, content_type, part) {
            Ok(notes) => Ok(notes),
            Err(e) => {
                warn!(error = %e, "plain-mode response also failed to parse");
                let mut notes = ContentNotes::placeholder(
                    title.unwrap_or(FALLBACK_TITLE),
                    "Notes generation encountered an error",
                );
                notes.key_insights.push(Insight {
                    insight: "Could not parse AI response".to_string(),
                    timestamp: None,
                    context: Some(e.to_string()),
                });
                Ok(notes)
            }
        }
    }

    fn parse_notes(
        &self,
        raw: &str,
        content_type: ContentType,
        part: Option<(usize, usize)>,
    ) -> serde_json::Result<ContentNotes> {
        let mut notes: ContentNotes = parse_json(raw)?;
        // Heuristic detection wins over whatever the model claims.
        notes.content_type = content_type;
        if notes.title.trim().is_empty() {
            notes.title = FALLBACK_TITLE.to_string();
        }
        if let Some((index, total)) = part {
            notes.title = format!("{} (Part {}/{})", notes.title, index, total);
        }
        Ok(notes)
    }
}

/// Merge per-window notes into one document.
///
/// Windows are already ordered, so iteration order preserves the
/// content's own ordering; items deduplicate on their normalized
/// primary text and each field is capped.
pub fn merge_notes(
    mut partials: Vec<ContentNotes>,
    original_title: Option<&str>,
    config: &SynthesisConfig,
) -> ContentNotes {
    if partials.is_empty() {
        return ContentNotes::placeholder(
            original_title.unwrap_or(FALLBACK_TITLE),
            "No content available",
        );
    }

    let title = original_title
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| strip_part_label(&partials[0].title));

    if partials.len() == 1 {
        let mut single = partials.swap_remove(0);
        single.title = title;
        return single;
    }

    // Most frequent content type; ties break toward first occurrence,
    // which insertion order preserves.
    let mut type_counts: IndexMap<ContentType, usize> = IndexMap::new();
    for notes in &partials {
        *type_counts.entry(notes.content_type).or_insert(0) += 1;
    }
    let mut content_type = ContentType::default();
    let mut best = 0;
    for (ty, count) in &type_counts {
        if *count > best {
            best = *count;
            content_type = *ty;
        }
    }

    let overview = merge_overview(&partials, config.overview_max_chars);

    ContentNotes {
        title,
        content_type,
        overview,
        table_of_contents: merge_field(
            partials.iter().map(|n| n.table_of_contents.as_slice()),
            |t| normalize_key(&t.section),
            CAP_TOC,
        ),
        main_concepts: merge_field(
            partials.iter().map(|n| n.main_concepts.as_slice()),
            |c| normalize_key(&c.concept),
            CAP_CONCEPTS,
        ),
        key_insights: merge_field(
            partials.iter().map(|n| n.key_insights.as_slice()),
            |i| normalize_key(&i.insight),
            CAP_INSIGHTS,
        ),
        detailed_notes: merge_field(
            partials.iter().map(|n| n.detailed_notes.as_slice()),
            |s| normalize_key(&s.section),
            CAP_DETAILED,
        ),
        notable_quotes: merge_field(
            partials.iter().map(|n| n.notable_quotes.as_slice()),
            |q| normalize_key(&q.quote),
            CAP_QUOTES,
        ),
        resources_mentioned: merge_field(
            partials.iter().map(|n| n.resources_mentioned.as_slice()),
            |s| normalize_key(s),
            CAP_RESOURCES,
        ),
        action_items: merge_field(
            partials.iter().map(|n| n.action_items.as_slice()),
            |s| normalize_key(s),
            CAP_ACTIONS,
        ),
        questions_raised: merge_field(
            partials.iter().map(|n| n.questions_raised.as_slice()),
            |s| normalize_key(s),
            CAP_QUESTIONS,
        ),
    }
}

fn merge_overview(partials: &[ContentNotes], max_chars: usize) -> String {
    let combined = partials
        .iter()
        .map(|n| n.overview.trim())
        .filter(|o| !o.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if combined.len() <= max_chars {
        return combined;
    }
    let mut end = max_chars.saturating_sub(3);
    while !combined.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &combined[..end])
}

fn merge_field<'a, T: Clone + 'a>(
    fields: impl Iterator<Item = &'a [T]>,
    key: impl Fn(&T) -> String,
    cap: usize,
) -> Vec<T> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut merged = Vec::new();

    for items in fields {
        for item in items {
            if merged.len() >= cap {
                return merged;
            }
            if seen.insert(key(item)) {
                merged.push(item.clone());
            }
        }
    }
    merged
}

/// Overwrite the generated title with the supplied one, when present.
fn restore_title(mut notes: ContentNotes, title: Option<&str>) -> ContentNotes {
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        notes.title = title.to_string();
    }
    notes
}

/// Drop a trailing " (Part i/n)" label from a per-window title.
fn strip_part_label(title: &str) -> String {
    match title.rfind(" (Part ") {
        Some(at) if title.ends_with(')') => title[..at].to_string(),
        _ => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::progress::NullProgress;
    use crate::testing::MockAi;

    fn minute_segments(minutes: usize) -> Vec<ContentSegment> {
        (0..minutes)
            .map(|i| {
                ContentSegment::new(
                    format!("spoken minute {i}"),
                    i as f64 * 60.0,
                    (i as f64 + 1.0) * 60.0,
                )
            })
            .collect()
    }

    fn valid_response(title: &str, insight: &str) -> String {
        format!(
            r#"{{"title": "{title}", "overview": "Overview of {title}.",
                "keyInsights": [{{"insight": "{insight}"}}],
                "resourcesMentioned": ["The Rust Book"]}}"#
        )
    }

    #[tokio::test]
    async fn empty_segments_need_no_ai() {
        let ai = MockAi::new();
        let engine = NotesEngine::new(ai.clone());
        let notes = engine
            .synthesize(&[], Some("Empty"), ContentType::General, &NullProgress)
            .await
            .unwrap();

        assert_eq!(notes.title, "Empty");
        assert_eq!(notes.overview, "No transcript available");
        assert!(notes.key_insights.is_empty());
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn short_content_uses_exactly_one_call() {
        let ai = MockAi::new().respond(valid_response("Generated", "One insight"));
        let engine = NotesEngine::new(ai.clone());

        let notes = engine
            .synthesize(
                &minute_segments(20),
                Some("Supplied Title"),
                ContentType::General,
                &NullProgress,
            )
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 1);
        assert_eq!(notes.title, "Supplied Title");
        assert_eq!(notes.key_insights.len(), 1);
    }

    #[tokio::test]
    async fn long_content_issues_one_call_per_window() {
        let ai = MockAi::new()
            .respond(valid_response("P1", "alpha"))
            .respond(valid_response("P2", "beta"))
            .respond(valid_response("P3", "alpha")) // duplicate of window 1
            .respond(valid_response("P4", "delta"));
        let engine = NotesEngine::new(ai.clone());

        let notes = engine
            .synthesize(
                &minute_segments(95),
                Some("Long Video"),
                ContentType::General,
                &NullProgress,
            )
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 4, "95 min / 30 min windows = 4 calls");
        assert_eq!(notes.title, "Long Video");
        // "alpha" appears in two windows but survives once.
        assert_eq!(notes.key_insights.len(), 3);
        assert_eq!(notes.key_insights[0].insight, "alpha");
        assert_eq!(notes.key_insights[1].insight, "beta");
        // Identical resources across windows dedupe to one.
        assert_eq!(notes.resources_mentioned.len(), 1);
    }

    #[tokio::test]
    async fn parse_failure_triggers_one_degraded_retry() {
        let ai = MockAi::new()
            .respond("this is not json")
            .respond(valid_response("Recovered", "from retry"));
        let engine = NotesEngine::new(ai.clone());

        let notes = engine
            .synthesize(
                &minute_segments(10),
                Some("T"),
                ContentType::General,
                &NullProgress,
            )
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 2);
        assert_eq!(notes.key_insights[0].insight, "from retry");
    }

    #[tokio::test]
    async fn double_parse_failure_degrades_to_placeholder() {
        let ai = MockAi::new().respond("garbage").respond("more garbage");
        let engine = NotesEngine::new(ai.clone());

        let notes = engine
            .synthesize(
                &minute_segments(10),
                Some("Resilient"),
                ContentType::General,
                &NullProgress,
            )
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 2);
        assert_eq!(notes.title, "Resilient");
        assert_eq!(notes.key_insights.len(), 1);
        assert_eq!(notes.key_insights[0].insight, "Could not parse AI response");
        assert!(notes.key_insights[0].context.is_some());
    }

    #[tokio::test]
    async fn fenced_responses_parse() {
        let fenced = format!("```json\n{}\n```", valid_response("Fenced", "insight"));
        let ai = MockAi::new().respond(fenced);
        let engine = NotesEngine::new(ai.clone());

        let notes = engine
            .synthesize(
                &minute_segments(5),
                None,
                ContentType::General,
                &NullProgress,
            )
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 1);
        assert_eq!(notes.title, "Fenced");
    }

    #[test]
    fn merge_is_idempotent_for_duplicate_insights() {
        let mut a = ContentNotes::placeholder("A (Part 1/2)", "First overview.");
        a.key_insights.push(Insight {
            insight: "The Same  Insight".into(),
            timestamp: Some("1:00".into()),
            context: None,
        });
        let mut b = ContentNotes::placeholder("A (Part 2/2)", "Second overview.");
        b.key_insights.push(Insight {
            insight: "the same insight".into(),
            timestamp: Some("31:00".into()),
            context: None,
        });

        let merged = merge_notes(vec![a, b], Some("A"), &SynthesisConfig::default());

        assert_eq!(merged.key_insights.len(), 1);
        // First occurrence wins, including its timestamp.
        assert_eq!(merged.key_insights[0].timestamp.as_deref(), Some("1:00"));
    }

    #[test]
    fn merge_caps_each_field() {
        let partials: Vec<ContentNotes> = (0..5)
            .map(|w| {
                let mut notes = ContentNotes::placeholder(format!("P{w}"), "o");
                for i in 0..10 {
                    notes.key_insights.push(Insight {
                        insight: format!("window {w} insight {i}"),
                        timestamp: None,
                        context: None,
                    });
                    notes.questions_raised.push(format!("w{w} q{i}"));
                }
                notes
            })
            .collect();

        let merged = merge_notes(partials, Some("T"), &SynthesisConfig::default());
        assert_eq!(merged.key_insights.len(), CAP_INSIGHTS);
        assert_eq!(merged.questions_raised.len(), CAP_QUESTIONS);
    }

    #[test]
    fn merge_picks_dominant_type_with_first_occurrence_ties() {
        let mut a = ContentNotes::placeholder("A", "oa");
        a.content_type = ContentType::Lecture;
        let mut b = ContentNotes::placeholder("B", "ob");
        b.content_type = ContentType::Interview;

        let merged = merge_notes(vec![a, b], Some("T"), &SynthesisConfig::default());
        assert_eq!(merged.content_type, ContentType::Lecture);
    }

    #[test]
    fn merge_truncates_overview() {
        let partials: Vec<ContentNotes> = (0..3)
            .map(|i| ContentNotes::placeholder(format!("P{i}"), "x".repeat(200)))
            .collect();
        let merged = merge_notes(partials, Some("T"), &SynthesisConfig::default());
        assert_eq!(merged.overview.len(), 300);
        assert!(merged.overview.ends_with("..."));
    }

    #[test]
    fn single_window_returns_unchanged_except_title() {
        let mut only = ContentNotes::placeholder("Generated (Part 1/1)", "overview");
        only.action_items.push("do the thing".into());

        let merged = merge_notes(vec![only], Some("Original"), &SynthesisConfig::default());
        assert_eq!(merged.title, "Original");
        assert_eq!(merged.action_items, vec!["do the thing".to_string()]);

        // Without a supplied title, the part label is stripped.
        let only = ContentNotes::placeholder("Generated (Part 1/3)", "overview");
        let merged = merge_notes(vec![only], None, &SynthesisConfig::default());
        assert_eq!(merged.title, "Generated");
    }

    #[test]
    fn detection_covers_the_extended_types() {
        assert_eq!(
            detect_content_type("let me show you how to build", "", ContentType::General),
            ContentType::Tutorial
        );
        assert_eq!(
            detect_content_type("welcome to this podcast", "", ContentType::General),
            ContentType::Podcast
        );
        assert_eq!(
            detect_content_type("my guest today is", "", ContentType::General),
            ContentType::Interview
        );
        assert_eq!(
            detect_content_type("", "CS101 Lecture 4", ContentType::General),
            ContentType::Lecture
        );
        assert_eq!(
            detect_content_type("the untold story of", "", ContentType::General),
            ContentType::Documentary
        );
        assert_eq!(
            detect_content_type("abstract. in this paper we propose", "", ContentType::Article),
            ContentType::Paper
        );
        // Nothing matches: the caller's default survives.
        assert_eq!(
            detect_content_type("plain prose", "title", ContentType::Article),
            ContentType::Article
        );
    }
}
