//! The job runner: background pipeline driving and the job consumer
//! contract.
//!
//! `JobService` is the entry point callers use: `submit` validates the
//! reference, creates a ledger entry, and spawns a detached task that
//! drives extract → synthesize → publish → persist, updating the
//! ledger at each stage; `poll` returns the ledger view. There is no
//! cancel operation: a caller that stops polling simply stops
//! observing, and the task runs to completion and still updates the
//! ledger.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Result, SynthesisError};
use crate::jobs::ledger::JobLedger;
use crate::pipeline::knowledge::KnowledgeEngine;
use crate::pipeline::notes::NotesEngine;
use crate::pipeline::progress::ProgressSink;
use crate::sources::cascade::SourceCascade;
use crate::traits::ai::Ai;
use crate::traits::publish::Publisher;
use crate::traits::store::{NotesRecord, NotesStore};
use crate::types::{
    ContentRef, ContentType, Job, JobStatus, JobUpdate, KnowledgeStatus, SourceKind,
};

/// Progress sink that maps an engine's phase fraction onto a band of
/// the job's overall progress.
struct JobProgress {
    ledger: Arc<JobLedger>,
    job_id: Uuid,
    band: (u8, u8),
}

#[async_trait]
impl ProgressSink for JobProgress {
    async fn report(&self, fraction: f32, stage: &str) {
        let (low, high) = self.band;
        let span = high.saturating_sub(low) as f32;
        let progress = low + (span * fraction.clamp(0.0, 1.0)) as u8;
        self.ledger
            .update(self.job_id, JobUpdate::progress(progress, stage))
            .await;
    }
}

/// The job consumer contract: create, drive, and poll synthesis jobs.
///
/// Cheap to clone; clones share the same ledger, engines, and stores.
pub struct JobService<A: Ai> {
    inner: Arc<ServiceInner<A>>,
}

impl<A: Ai> Clone for JobService<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ServiceInner<A: Ai> {
    ledger: Arc<JobLedger>,
    cascade: SourceCascade,
    notes_engine: NotesEngine<A>,
    knowledge_engine: KnowledgeEngine<A>,
    notes_store: Arc<dyn NotesStore>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl<A: Ai + Send + Sync + 'static> JobService<A> {
    /// Assemble a service from its collaborators.
    pub fn new(
        ledger: Arc<JobLedger>,
        cascade: SourceCascade,
        notes_engine: NotesEngine<A>,
        knowledge_engine: KnowledgeEngine<A>,
        notes_store: Arc<dyn NotesStore>,
        publisher: Option<Arc<dyn Publisher>>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                ledger,
                cascade,
                notes_engine,
                knowledge_engine,
                notes_store,
                publisher,
            }),
        }
    }

    /// Create a synthesis job and start processing it in the
    /// background. Returns immediately with the pending job.
    pub async fn submit(&self, owner_id: &str, url: &str) -> Result<Job> {
        let reference = ContentRef::parse(url)?;
        if !self.inner.cascade.supports(&reference) {
            return Err(SynthesisError::InvalidReference(format!(
                "{:?} content is not supported yet",
                reference.kind
            )));
        }

        let job = self.inner.ledger.create(owner_id, url).await;

        let inner = Arc::clone(&self.inner);
        let job_id = job.id;
        let owner = owner_id.to_string();
        tokio::spawn(async move {
            inner.process_notes_job(job_id, owner, reference).await;
        });

        Ok(job)
    }

    /// Poll a job's current state.
    pub async fn poll(&self, job_id: Uuid) -> Option<Job> {
        self.inner.ledger.get(job_id).await
    }

    /// Create a knowledge-map rebuild job for an owner and start it in
    /// the background.
    pub async fn submit_rebuild(&self, owner_id: &str) -> Job {
        let job = self.inner.ledger.create(owner_id, "knowledge-map").await;

        let inner = Arc::clone(&self.inner);
        let job_id = job.id;
        let owner = owner_id.to_string();
        tokio::spawn(async move {
            inner.process_knowledge_job(job_id, owner).await;
        });

        job
    }

    /// The owner's knowledge map with staleness information.
    pub async fn knowledge_status(&self, owner_id: &str) -> Result<Option<KnowledgeStatus>> {
        self.inner.knowledge_engine.status(owner_id).await
    }
}

impl<A: Ai> ServiceInner<A> {
    async fn process_notes_job(&self, job_id: Uuid, owner_id: String, reference: ContentRef) {
        if let Err(e) = self.run_notes_pipeline(job_id, &owner_id, &reference).await {
            error!(job_id = %job_id, error = %e, "notes job failed");
            self.ledger
                .update(job_id, JobUpdate::failed(friendly_error(&e.to_string())))
                .await;
        }
    }

    async fn run_notes_pipeline(
        &self,
        job_id: Uuid,
        owner_id: &str,
        reference: &ContentRef,
    ) -> Result<()> {
        self.ledger
            .update(
                job_id,
                JobUpdate {
                    status: Some(JobStatus::Processing),
                    progress: Some(5),
                    stage: Some("Fetching transcript".to_string()),
                    ..Default::default()
                },
            )
            .await;

        let transcript = self.cascade.extract(reference).await?;
        info!(
            job_id = %job_id,
            segments = transcript.segments.len(),
            "transcript ready"
        );
        self.ledger
            .update(job_id, JobUpdate::progress(25, "Transcript extracted"))
            .await;
        self.ledger
            .update(job_id, JobUpdate::progress(50, "Generating notes"))
            .await;

        let progress = JobProgress {
            ledger: Arc::clone(&self.ledger),
            job_id,
            band: (50, 85),
        };
        let notes = self
            .notes_engine
            .synthesize(
                &transcript.segments,
                transcript.title.as_deref(),
                default_content_type(reference.kind),
                &progress,
            )
            .await?;
        self.ledger
            .update(job_id, JobUpdate::progress(85, "Notes complete"))
            .await;

        let mut record = NotesRecord::new(owner_id, reference.short_ref(), notes);

        // Publishing is best-effort: its failure is reported in the
        // result payload, never as a job failure.
        let mut publish_error = None;
        if let Some(publisher) = &self.publisher {
            self.ledger
                .update(job_id, JobUpdate::progress(90, "Publishing notes"))
                .await;
            match publisher.publish(&record).await {
                Ok(url) => record.published_url = Some(url),
                Err(e) => {
                    warn!(job_id = %job_id, publisher = publisher.name(), error = %e, "publish failed");
                    publish_error =
                        Some("Publishing failed; your notes are still saved.".to_string());
                }
            }
        } else {
            self.ledger
                .update(job_id, JobUpdate::progress(90, "Saving notes"))
                .await;
        }

        // Persistence of the record is also non-fatal for the job.
        if let Err(e) = self.notes_store.insert(&record).await {
            warn!(job_id = %job_id, error = %e, "notes persistence failed");
        }

        self.ledger
            .update(
                job_id,
                JobUpdate::complete(json!({
                    "title": record.title,
                    "notesId": record.id.to_string(),
                    "publishedUrl": record.published_url,
                    "publishError": publish_error,
                })),
            )
            .await;
        info!(job_id = %job_id, title = %record.title, "notes job complete");
        Ok(())
    }

    async fn process_knowledge_job(&self, job_id: Uuid, owner_id: String) {
        if let Err(e) = self.run_knowledge_pipeline(job_id, &owner_id).await {
            error!(job_id = %job_id, error = %e, "knowledge job failed");
            self.ledger
                .update(job_id, JobUpdate::failed(friendly_error(&e.to_string())))
                .await;
        }
    }

    async fn run_knowledge_pipeline(&self, job_id: Uuid, owner_id: &str) -> Result<()> {
        self.ledger
            .update(
                job_id,
                JobUpdate {
                    status: Some(JobStatus::Processing),
                    progress: Some(10),
                    stage: Some("Collecting notes".to_string()),
                    ..Default::default()
                },
            )
            .await;

        let progress = JobProgress {
            ledger: Arc::clone(&self.ledger),
            job_id,
            band: (10, 90),
        };
        let map = self.knowledge_engine.rebuild(owner_id, &progress).await?;

        self.ledger
            .update(
                job_id,
                JobUpdate::complete(json!({
                    "version": map.version,
                    "topics": map.topics.len(),
                    "sourceCount": map.source_count,
                })),
            )
            .await;
        Ok(())
    }
}

/// Default content category for a source kind, used to seed detection.
fn default_content_type(kind: SourceKind) -> ContentType {
    match kind {
        SourceKind::Video => ContentType::General,
        SourceKind::Article => ContentType::Article,
        SourceKind::Pdf => ContentType::Paper,
        SourceKind::Podcast => ContentType::Podcast,
    }
}

/// Convert internal error text into a short, user-presentable message.
/// Raw diagnostic detail stays in the logs and never reaches the job
/// record.
pub fn friendly_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("subtitles are disabled") || lower.contains("captions disabled") {
        return "This content doesn't have captions enabled. The owner has disabled them."
            .to_string();
    }
    if lower.contains("multiple empty responses") || lower.contains("captions are likely protected")
    {
        return "This content's captions are protected. Please try a different link.".to_string();
    }
    if lower.contains("verification required") || lower.contains("sign in to confirm") {
        return "This content requires additional verification. Please try a different link."
            .to_string();
    }
    if lower.contains("invalid content reference") || lower.contains("not supported yet") {
        return "We couldn't recognize that link. Please check the URL and try again.".to_string();
    }
    if lower.contains("content not found") || lower.contains("no transcript") {
        return "No transcript is available for this content. Try a different link.".to_string();
    }
    if lower.contains("rate limit") || lower.contains("too many requests") {
        return "Too many requests right now. Please wait a moment and try again.".to_string();
    }
    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("network error")
    {
        return "Connection trouble while processing. Please try again in a few minutes."
            .to_string();
    }
    if error.len() > 100 {
        return "Something went wrong. Please try a different link.".to_string();
    }
    error.to_string()
}

/// Spawn the periodic retention sweep that deletes jobs older than
/// `max_age` from the ledger, every `every`.
pub fn spawn_retention_sweep(
    ledger: Arc<JobLedger>,
    max_age: chrono::Duration,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; skip it so the sweep
        // runs on the configured cadence.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = ledger.sweep(max_age).await;
            if removed > 0 {
                info!(removed, "retention sweep removed old jobs");
            }
        }
    })
}
