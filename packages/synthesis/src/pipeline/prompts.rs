//! LLM prompts for notes synthesis and knowledge-map reduction.

use crate::types::{ContentSegment, ContentType, format_timestamp, total_duration};

/// JSON output contract for notes synthesis.
const NOTES_OUTPUT_FORMAT: &str = r#"
Respond in this EXACT JSON format (no markdown, just raw JSON):
{
  "title": "Clear, descriptive title",
  "contentType": "detected content type",
  "overview": "One comprehensive sentence summarizing the entire content",
  "tableOfContents": [
    {"section": "Section name", "timestamp": "M:SS", "description": "Brief description"}
  ],
  "mainConcepts": [
    {"concept": "Concept name", "definition": "Clear explanation", "timestamp": "M:SS", "examples": ["Example 1"]}
  ],
  "keyInsights": [
    {"insight": "The key insight", "timestamp": "M:SS", "context": "Why this matters"}
  ],
  "detailedNotes": [
    {"section": "Topic/Section", "timestamp": "M:SS", "points": ["Point 1", "Point 2"]}
  ],
  "notableQuotes": [
    {"quote": "Exact or paraphrased quote", "speaker": "Speaker name if known", "timestamp": "M:SS"}
  ],
  "resourcesMentioned": ["Book, website, or tool 1"],
  "actionItems": ["Action 1"],
  "questionsRaised": ["Open question 1"]
}

GUIDELINES:
- Under 15 minutes of content: 3-5 main concepts, 5-8 insights, 2-3 detailed sections
- 15-45 minutes: 5-8 main concepts, 8-12 insights, 3-5 detailed sections
- 45+ minutes: 8-12 main concepts, 12-20 insights, 5-8 detailed sections
- Capture content from the ENTIRE input, not just the beginning
- Include timestamps when the topic or insight appears
- Include specific details, numbers, and names when mentioned
- Empty arrays are fine if a section does not apply"#;

/// Content-type-specific extraction instructions.
fn type_instructions(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Lecture => {
            "You are creating comprehensive LECTURE NOTES for a student. Extract:\n\
             1. Main concepts with clear definitions, noting when each is introduced\n\
             2. Examples and case studies mentioned\n\
             3. Key formulas, frameworks, or models\n\
             4. Connections between concepts\n\
             5. Any recommended readings or resources\n\
             Think like a diligent student taking notes and capture everything important."
        }
        ContentType::Interview | ContentType::Podcast => {
            "You are creating notes from a PODCAST/INTERVIEW. Extract:\n\
             1. Key perspectives from each speaker\n\
             2. Important quotes, verbatim when possible, with timestamps\n\
             3. Stories and anecdotes shared\n\
             4. Advice or recommendations given\n\
             5. Books, people, or resources mentioned\n\
             Capture the unique insights from this conversation."
        }
        ContentType::Tutorial => {
            "You are creating a STEP-BY-STEP GUIDE from this tutorial. Extract:\n\
             1. Prerequisites or setup required\n\
             2. Each step in order, with the timestamp where it starts\n\
             3. Commands, code snippets, or specific actions\n\
             4. Common mistakes or warnings mentioned\n\
             5. Tips and best practices\n\
             Make the notes actionable; someone should be able to follow them."
        }
        ContentType::Documentary => {
            "You are creating notes from a DOCUMENTARY. Extract:\n\
             1. Timeline of events or narrative arc, with timestamps\n\
             2. Key facts and statistics\n\
             3. Important people and their roles\n\
             4. Sources or evidence cited\n\
             5. Main arguments or conclusions\n\
             Capture the story and its supporting evidence."
        }
        ContentType::Article | ContentType::Paper => {
            "You are creating notes from a written ARTICLE or PAPER. Extract:\n\
             1. The thesis and main arguments\n\
             2. Key claims with their supporting evidence\n\
             3. Methods, data, or examples presented\n\
             4. Cited works and resources\n\
             5. Conclusions and open questions\n\
             Preserve the author's structure where it helps navigation."
        }
        ContentType::General => {
            "You are creating comprehensive NOTES from this content. Extract:\n\
             1. Main topic and thesis\n\
             2. Key points and supporting details\n\
             3. Examples and evidence\n\
             4. Notable quotes or statements with timestamps\n\
             5. Any calls to action or recommendations\n\
             Be thorough and capture all important information."
        }
    }
}

/// Render segments as a transcript with `[M:SS]` markers about every
/// minute, truncated to the character budget.
fn timestamped_transcript(segments: &[ContentSegment], char_budget: usize) -> String {
    let mut out = String::new();
    let mut last_marker = f64::NEG_INFINITY;

    for segment in segments {
        if segment.start_time - last_marker >= 60.0 {
            out.push_str("\n[");
            out.push_str(&segment.timestamp_str());
            out.push_str("] ");
            last_marker = segment.start_time;
        } else {
            out.push(' ');
        }
        out.push_str(segment.text.trim());
        if out.len() >= char_budget {
            break;
        }
    }

    truncate_chars(&out, char_budget).trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Build the timestamped notes-synthesis prompt for one window.
///
/// `part` tags chunked calls with their window index and total count.
pub fn notes_prompt(
    segments: &[ContentSegment],
    content_type: ContentType,
    part: Option<(usize, usize)>,
    char_budget: usize,
) -> String {
    let transcript = timestamped_transcript(segments, char_budget);
    let word_count = transcript.split_whitespace().count();
    let duration = format_timestamp(total_duration(segments));

    let part_line = match part {
        Some((index, total)) => format!("- Segment: part {index} of {total}\n"),
        None => String::new(),
    };

    format!(
        "CONTENT INFO:\n\
         - Duration: {duration} of spoken content\n\
         - Word count: {word_count} words\n\
         - Content type: {content_type}\n\
         {part_line}\n\
         TIMESTAMPED TRANSCRIPT:\n\
         The transcript below includes [M:SS] timestamps. Use these to reference when topics appear.\n\n\
         {transcript}\n\n\
         {instructions}\n\
         {format}",
        instructions = type_instructions(content_type),
        format = NOTES_OUTPUT_FORMAT,
    )
}

/// Degraded-mode prompt: flat text, no timestamp obligations. Used as
/// the one retry after a response that failed to parse.
pub fn plain_notes_prompt(flat_text: &str, content_type: ContentType, char_budget: usize) -> String {
    let text = truncate_chars(flat_text, char_budget);
    let word_count = text.split_whitespace().count();

    format!(
        "CONTENT LENGTH: approximately {} minutes ({word_count} words)\n\
         CONTENT TYPE: {content_type}\n\n\
         TRANSCRIPT:\n{text}\n\n\
         {instructions}\n\
         {format}",
        word_count / 150,
        instructions = type_instructions(content_type),
        format = NOTES_OUTPUT_FORMAT,
    )
}

/// System prompt for knowledge-map synthesis over condensed documents.
pub const KNOWLEDGE_SYNTHESIS_PROMPT: &str = r#"You are a Knowledge Synthesis Agent. Analyze a collection of
document summaries and create a structured knowledge map revealing the
topics, key information, and connections across all the content.

INPUT: a JSON list of documents, each with an id, title, and source reference.

OUTPUT: a JSON object with this EXACT structure (no markdown, no code fences):
{
  "topics": [
    {
      "name": "Topic Name",
      "description": "2-3 sentence description of what this topic covers",
      "facts": [
        {"fact": "Key fact or insight", "sourceId": "document id", "sourceTitle": "Document Title"}
      ],
      "relatedTopics": ["Other Topic Name"],
      "sourceIds": ["doc1", "doc2"],
      "importance": 8
    }
  ],
  "connections": [
    {"from": "Topic A", "to": "Topic B", "relationship": "builds on"}
  ]
}

RULES:
1. Extract 5-20 distinct topics depending on the breadth of content
2. Topics must be specific enough to be useful ("React Server Components", not "Programming")
3. Every fact MUST trace back to a source document via sourceId and sourceTitle
4. Importance (1-10) reflects how many documents discuss the topic and the depth of coverage
5. Connections are meaningful relationships ("builds on", "contrasts with", "prerequisite for")
6. Merge near-duplicate topics into one
7. Include domain-specific topics AND cross-cutting themes
8. With a single document, create 3-5 topics from its content
9. Sort topics by importance, highest first
10. Return ONLY the JSON object, no other text"#;

/// Build the batch synthesis prompt.
pub fn knowledge_batch_prompt(refs_json: &str, count: usize, batch: Option<(usize, usize)>) -> String {
    let batch_line = match batch {
        Some((index, total)) => format!(" (batch {index} of {total})"),
        None => String::new(),
    };
    format!(
        "{KNOWLEDGE_SYNTHESIS_PROMPT}\n\nHere are {count} document summaries to analyze{batch_line}:\n\n{refs_json}"
    )
}

/// Build the pairwise merge prompt for two partial maps.
pub fn knowledge_merge_prompt(map_a: &str, map_b: &str) -> String {
    format!(
        "You are a Knowledge Synthesis Agent. Merge these two partial knowledge maps into one unified map.\n\n\
         Partial Map 1:\n{map_a}\n\n\
         Partial Map 2:\n{map_b}\n\n\
         MERGE RULES:\n\
         1. Combine duplicate topics (same or very similar names): merge their facts and source lists\n\
         2. Keep all unique topics from both maps\n\
         3. Update importance scores based on the combined coverage\n\
         4. Merge and deduplicate connections\n\
         5. Ensure no duplicate facts\n\
         6. Return the unified map in the same JSON format\n\n\
         Return ONLY the merged JSON object, no other text."
    )
}
