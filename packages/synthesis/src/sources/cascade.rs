//! Cascading transcript extraction with outcome classification.
//!
//! Sources are tried in preference order. Each attempt's result is
//! classified into one of four outcomes, and all control flow switches
//! on that enum: transient blocks are retried with exponential backoff
//! within a per-source budget, permanent blocks and missing content
//! abandon the source, and the first success short-circuits the whole
//! cascade.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, SourceError, SourceResult, SynthesisError};
use crate::traits::source::{Transcript, TranscriptSource};
use crate::types::{CascadeConfig, ContentRef};

/// Classified result of a single fetch attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Non-empty transcript retrieved
    Success(Transcript),
    /// Retry-worthy: throttling, server trouble, timeouts, or a first
    /// empty response
    TransientBlock(String),
    /// Retrying cannot help: verification walls, client errors, or
    /// repeated silent emptiness
    PermanentBlock(String),
    /// The reference does not exist at this source; never retried
    NotFound(String),
}

/// Classify one fetch result.
///
/// `empty_streak` counts consecutive empty-but-successful responses
/// from the current source, including this one. Two in a row, with no
/// content retrieved yet, reclassify as a permanent block: genuine
/// throttling eventually yields content, while silent protocol-level
/// blocking keeps answering success with nothing. This is a heuristic,
/// not a guarantee — a legitimately captionless video looks the same —
/// but retrying an empty well is the worse trade.
pub fn classify(result: SourceResult<Transcript>, empty_streak: u32) -> Outcome {
    match result {
        Ok(transcript) if !transcript.is_empty() => Outcome::Success(transcript),
        Ok(_) => {
            if empty_streak >= 2 {
                Outcome::PermanentBlock(
                    "multiple empty responses; captions are likely protected".to_string(),
                )
            } else {
                Outcome::TransientBlock("empty response".to_string())
            }
        }
        Err(e) => match e {
            SourceError::RateLimited => Outcome::TransientBlock("rate limited".to_string()),
            SourceError::Timeout => Outcome::TransientBlock("request timed out".to_string()),
            SourceError::Network(m) => Outcome::TransientBlock(format!("network error: {m}")),
            SourceError::Malformed(m) => {
                Outcome::TransientBlock(format!("malformed response: {m}"))
            }
            SourceError::Http { status: 429, .. } => {
                Outcome::TransientBlock("rate limited".to_string())
            }
            SourceError::Http { status, message } if status >= 500 => {
                Outcome::TransientBlock(format!("HTTP {status}: {message}"))
            }
            SourceError::Http { status: 404, message } => Outcome::NotFound(message),
            SourceError::Http { status, message } => {
                Outcome::PermanentBlock(format!("HTTP {status}: {message}"))
            }
            SourceError::VerificationRequired(m) => {
                Outcome::PermanentBlock(format!("verification required: {m}"))
            }
            SourceError::NotFound(m) => Outcome::NotFound(m),
        },
    }
}

/// Ordered cascade over transcript sources.
pub struct SourceCascade {
    sources: Vec<Arc<dyn TranscriptSource>>,
    config: CascadeConfig,
}

impl SourceCascade {
    /// Create a cascade over sources in preference order (most
    /// reliable first).
    pub fn new(sources: Vec<Arc<dyn TranscriptSource>>) -> Self {
        Self {
            sources,
            config: CascadeConfig::default(),
        }
    }

    /// Override the retry configuration.
    pub fn with_config(mut self, config: CascadeConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a source at the end of the preference order.
    pub fn push(&mut self, source: Arc<dyn TranscriptSource>) {
        self.sources.push(source);
    }

    /// Whether any source can handle the reference.
    pub fn supports(&self, reference: &ContentRef) -> bool {
        self.sources.iter().any(|s| s.supports(reference))
    }

    /// Extract a transcript, trying each applicable source in order.
    pub async fn extract(&self, reference: &ContentRef) -> Result<Transcript> {
        let mut last_error: Option<String> = None;
        let mut last_was_not_found = false;
        let mut attempted_any = false;

        for source in &self.sources {
            if !source.supports(reference) {
                debug!(source = source.name(), "source skipped (unsupported reference)");
                continue;
            }
            attempted_any = true;

            let mut empty_streak = 0u32;
            for attempt in 0..self.config.max_attempts {
                let result = match tokio::time::timeout(
                    self.config.attempt_timeout,
                    source.fetch(reference),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout),
                };

                // Track consecutive empty-but-successful responses for
                // the silent-blocking reclassification.
                if matches!(&result, Ok(t) if t.is_empty()) {
                    empty_streak += 1;
                } else {
                    empty_streak = 0;
                }

                match classify(result, empty_streak) {
                    Outcome::Success(transcript) => {
                        info!(
                            source = source.name(),
                            segments = transcript.segments.len(),
                            "transcript extracted"
                        );
                        return Ok(transcript);
                    }
                    Outcome::TransientBlock(reason) => {
                        last_error = Some(reason.clone());
                        last_was_not_found = false;
                        if attempt + 1 < self.config.max_attempts {
                            let delay = self.config.backoff_base * 2u32.pow(attempt);
                            debug!(
                                source = source.name(),
                                attempt = attempt + 1,
                                delay_ms = delay.as_millis() as u64,
                                reason = %reason,
                                "transient block, backing off"
                            );
                            tokio::time::sleep(delay).await;
                        } else {
                            warn!(
                                source = source.name(),
                                reason = %reason,
                                "retry budget exhausted, advancing to next source"
                            );
                        }
                    }
                    Outcome::PermanentBlock(reason) => {
                        warn!(
                            source = source.name(),
                            reason = %reason,
                            "permanent block, abandoning source"
                        );
                        last_error = Some(reason);
                        last_was_not_found = false;
                        break;
                    }
                    Outcome::NotFound(reason) => {
                        warn!(source = source.name(), reason = %reason, "content not found");
                        last_error = Some(reason);
                        last_was_not_found = true;
                        break;
                    }
                }
            }
        }

        if !attempted_any {
            return Err(SynthesisError::InvalidReference(format!(
                "no source supports {}",
                reference.url
            )));
        }

        let summary = last_error.unwrap_or_else(|| "no source produced a transcript".to_string());
        if last_was_not_found {
            Err(SynthesisError::NotFound(summary))
        } else {
            Err(SynthesisError::SourcesExhausted(summary))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::ScriptedSource;
    use crate::types::ContentSegment;

    fn video_ref() -> ContentRef {
        ContentRef::parse("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![ContentSegment::new("hello world", 0.0, 4.0)])
            .with_title("Sample")
    }

    fn cascade(sources: Vec<Arc<ScriptedSource>>) -> SourceCascade {
        let sources = sources
            .into_iter()
            .map(|s| s as Arc<dyn TranscriptSource>)
            .collect();
        SourceCascade::new(sources).with_config(CascadeConfig {
            max_attempts: 3,
            backoff_base: std::time::Duration::from_millis(10),
            attempt_timeout: std::time::Duration::from_secs(5),
        })
    }

    #[test]
    fn classify_maps_transient_signals() {
        for err in [
            SourceError::RateLimited,
            SourceError::Timeout,
            SourceError::Network("reset".into()),
            SourceError::Malformed("bad json".into()),
            SourceError::Http {
                status: 503,
                message: "unavailable".into(),
            },
            SourceError::Http {
                status: 429,
                message: "slow down".into(),
            },
        ] {
            assert!(
                matches!(classify(Err(err), 0), Outcome::TransientBlock(_)),
                "expected transient"
            );
        }
    }

    #[test]
    fn classify_maps_permanent_signals() {
        assert!(matches!(
            classify(Err(SourceError::VerificationRequired("captcha".into())), 0),
            Outcome::PermanentBlock(_)
        ));
        assert!(matches!(
            classify(
                Err(SourceError::Http {
                    status: 403,
                    message: "forbidden".into()
                }),
                0
            ),
            Outcome::PermanentBlock(_)
        ));
    }

    #[test]
    fn classify_maps_not_found() {
        assert!(matches!(
            classify(Err(SourceError::NotFound("gone".into())), 0),
            Outcome::NotFound(_)
        ));
        assert!(matches!(
            classify(
                Err(SourceError::Http {
                    status: 404,
                    message: "missing".into()
                }),
                0
            ),
            Outcome::NotFound(_)
        ));
    }

    #[test]
    fn classify_empty_responses_escalate() {
        assert!(matches!(
            classify(Ok(Transcript::default()), 1),
            Outcome::TransientBlock(_)
        ));
        assert!(matches!(
            classify(Ok(Transcript::default()), 2),
            Outcome::PermanentBlock(_)
        ));
    }

    #[tokio::test]
    async fn success_short_circuits_remaining_sources() {
        let primary = Arc::new(ScriptedSource::new("primary").ok(transcript()));
        let secondary = Arc::new(ScriptedSource::new("secondary").ok(transcript()));

        let result = cascade(vec![primary.clone(), secondary.clone()])
            .extract(&video_ref())
            .await
            .unwrap();

        assert_eq!(result.segments.len(), 1);
        assert_eq!(primary.fetch_count(), 1);
        assert_eq!(secondary.fetch_count(), 0, "later source must not run");
    }

    #[tokio::test(start_paused = true)]
    async fn two_empty_responses_abandon_before_third_attempt() {
        let blocked = Arc::new(
            ScriptedSource::new("blocked")
                .ok(Transcript::default())
                .ok(Transcript::default())
                .ok(Transcript::default()),
        );
        let backup = Arc::new(ScriptedSource::new("backup").ok(transcript()));

        let result = cascade(vec![blocked.clone(), backup.clone()])
            .extract(&video_ref())
            .await
            .unwrap();

        assert_eq!(
            blocked.fetch_count(),
            2,
            "permanent block must fire before a third attempt"
        );
        assert_eq!(backup.fetch_count(), 1);
        assert!(!result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_block_retries_same_source() {
        let flaky = Arc::new(
            ScriptedSource::new("flaky")
                .err(SourceError::RateLimited)
                .err(SourceError::Timeout)
                .ok(transcript()),
        );

        let result = cascade(vec![flaky.clone()]).extract(&video_ref()).await;

        assert!(result.is_ok());
        assert_eq!(flaky.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_exhaustion_advances() {
        let down = Arc::new(
            ScriptedSource::new("down")
                .err(SourceError::RateLimited)
                .err(SourceError::RateLimited)
                .err(SourceError::RateLimited),
        );
        let backup = Arc::new(ScriptedSource::new("backup").ok(transcript()));

        cascade(vec![down.clone(), backup.clone()])
            .extract(&video_ref())
            .await
            .unwrap();

        assert_eq!(down.fetch_count(), 3);
        assert_eq!(backup.fetch_count(), 1);
    }

    #[tokio::test]
    async fn not_found_abandons_source_without_retry() {
        let missing = Arc::new(ScriptedSource::new("missing").err(SourceError::NotFound(
            "no captions for this video".into(),
        )));
        let backup = Arc::new(ScriptedSource::new("backup").ok(transcript()));

        cascade(vec![missing.clone(), backup.clone()])
            .extract(&video_ref())
            .await
            .unwrap();

        assert_eq!(missing.fetch_count(), 1, "not-found is never retried");
        assert_eq!(backup.fetch_count(), 1);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_last_meaningful_error() {
        let first = Arc::new(ScriptedSource::new("first").err(SourceError::VerificationRequired(
            "sign in to confirm".into(),
        )));
        let second = Arc::new(
            ScriptedSource::new("second").err(SourceError::NotFound("video removed".into())),
        );

        let err = cascade(vec![first, second])
            .extract(&video_ref())
            .await
            .unwrap_err();

        assert!(
            matches!(err, SynthesisError::NotFound(ref m) if m.contains("removed")),
            "last meaningful error wins: {err}"
        );
    }

    #[tokio::test]
    async fn unsupported_sources_are_skipped() {
        let article_only =
            Arc::new(ScriptedSource::new("articles").ok(transcript()).articles_only());
        let video = Arc::new(ScriptedSource::new("video").ok(transcript()));

        cascade(vec![article_only.clone(), video.clone()])
            .extract(&video_ref())
            .await
            .unwrap();

        assert_eq!(article_only.fetch_count(), 0);
        assert_eq!(video.fetch_count(), 1);
    }

    #[tokio::test]
    async fn no_applicable_source_is_invalid_reference() {
        let article_only =
            Arc::new(ScriptedSource::new("articles").ok(transcript()).articles_only());

        let err = cascade(vec![article_only])
            .extract(&video_ref())
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::InvalidReference(_)));
    }
}
