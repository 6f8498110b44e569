//! Web article source.
//!
//! Fetches a page and extracts the main text from paragraph tags,
//! grouping paragraphs into ~2000-character segments with synthetic
//! one-minute timestamps so the same synthesis pipeline handles
//! articles and videos uniformly.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::{Transcript, TranscriptSource};
use crate::types::{ContentRef, ContentSegment, SourceKind};

const CHARS_PER_SEGMENT: usize = 2000;
const SECONDS_PER_SEGMENT: f64 = 60.0;
const MIN_MEANINGFUL_CHARS: usize = 50;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn paragraph_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap())
}

fn noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ["script", "style", "nav", "header", "footer", "aside", "noscript"]
            .iter()
            .map(|tag| Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>")).unwrap())
            .collect()
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Web article transcript source.
pub struct ArticleSource {
    client: Client,
}

impl Default for ArticleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleSource {
    /// Create a new article source.
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }
}

/// Extract the page title and main paragraph text from raw HTML.
fn extract_text(html: &str) -> (Option<String>, Vec<String>) {
    let title = title_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_tags(m.as_str()))
        .filter(|t| !t.is_empty());

    let mut cleaned = html.to_string();
    for pattern in noise_patterns() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    let paragraphs: Vec<String> = paragraph_pattern()
        .captures_iter(&cleaned)
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_tags(m.as_str()))
        .filter(|p| p.len() > 20)
        .collect();

    (title, paragraphs)
}

fn strip_tags(html: &str) -> String {
    let stripped = tag_pattern().replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Group paragraphs into segments of roughly `CHARS_PER_SEGMENT`
/// characters with synthetic timestamps, one minute per segment.
fn paragraphs_to_segments(paragraphs: &[String]) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_chars = 0;

    let flush = |current: &mut Vec<&str>, segments: &mut Vec<ContentSegment>| {
        if current.is_empty() {
            return;
        }
        let index = segments.len() as f64;
        segments.push(ContentSegment::new(
            current.join("\n"),
            index * SECONDS_PER_SEGMENT,
            (index + 1.0) * SECONDS_PER_SEGMENT,
        ));
        current.clear();
    };

    for paragraph in paragraphs {
        current.push(paragraph);
        current_chars += paragraph.len();
        if current_chars >= CHARS_PER_SEGMENT {
            flush(&mut current, &mut segments);
            current_chars = 0;
        }
    }
    flush(&mut current, &mut segments);

    segments
}

#[async_trait]
impl TranscriptSource for ArticleSource {
    async fn fetch(&self, reference: &ContentRef) -> SourceResult<Transcript> {
        debug!(url = %reference.url, "article fetch starting");

        let response = self
            .client
            .get(&reference.url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimited);
        }
        if status.as_u16() == 404 {
            return Err(SourceError::NotFound(format!("{} not found", reference.url)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let (title, paragraphs) = extract_text(&html);
        let total_chars: usize = paragraphs.iter().map(|p| p.len()).sum();

        // Paywalled and script-rendered pages come back with a shell of
        // markup and no body text. Report an empty transcript; the
        // cascade treats repeats as blocking.
        if total_chars < MIN_MEANINGFUL_CHARS {
            info!(url = %reference.url, "article had no extractable text");
            return Ok(Transcript::default());
        }

        let segments = paragraphs_to_segments(&paragraphs);
        info!(
            url = %reference.url,
            segments = segments.len(),
            chars = total_chars,
            "article extracted"
        );

        let mut transcript = Transcript::new(segments);
        if let Some(title) = title {
            transcript = transcript.with_title(title);
        }
        Ok(transcript)
    }

    fn supports(&self, reference: &ContentRef) -> bool {
        reference.kind == SourceKind::Article
    }

    fn name(&self) -> &str {
        "article"
    }
}
