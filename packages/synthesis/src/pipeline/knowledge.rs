//! The knowledge reduction engine.
//!
//! Reduces all of an owner's notes documents into one knowledge map.
//! Small collections go through a single synthesis call; larger ones
//! are batched, then pairwise-merged over an explicit work queue so
//! the merge order (and therefore the output) is deterministic for a
//! given input and provider.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::pipeline::progress::ProgressSink;
use crate::pipeline::prompts::{knowledge_batch_prompt, knowledge_merge_prompt};
use crate::pipeline::response::parse_json;
use crate::traits::ai::Ai;
use crate::traits::store::{KnowledgeStore, NotesRef, NotesStore};
use crate::types::{KnowledgeMap, KnowledgeStatus, SynthesisConfig, Topic};

/// The knowledge reduction engine.
pub struct KnowledgeEngine<A: Ai> {
    ai: A,
    notes_store: Arc<dyn NotesStore>,
    knowledge_store: Arc<dyn KnowledgeStore>,
    config: SynthesisConfig,
}

impl<A: Ai> KnowledgeEngine<A> {
    /// Create an engine over the given stores.
    pub fn new(
        ai: A,
        notes_store: Arc<dyn NotesStore>,
        knowledge_store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            ai,
            notes_store,
            knowledge_store,
            config: SynthesisConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(mut self, config: SynthesisConfig) -> Self {
        self.config = config;
        self
    }

    /// Rebuild the owner's knowledge map from all persisted notes.
    ///
    /// Persists the result with a bumped version. Concurrent rebuilds
    /// for one owner race with last-writer-wins semantics; that is an
    /// accepted limitation of the keyed store contract.
    pub async fn rebuild(
        &self,
        owner_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<KnowledgeMap> {
        let refs = self.notes_store.list_refs(owner_id).await?;
        if refs.is_empty() {
            info!(owner_id = %owner_id, "no notes to reduce, skipping rebuild");
            return Ok(KnowledgeMap::default());
        }
        info!(owner_id = %owner_id, documents = refs.len(), "rebuilding knowledge map");

        let mut map = self.reduce(&refs, progress).await?;
        map.source_count = refs.len();
        map.sort_topics();

        let previous_version = self
            .knowledge_store
            .get(owner_id)
            .await?
            .map(|existing| existing.version)
            .unwrap_or(0);
        map.version = previous_version + 1;

        self.knowledge_store.put(owner_id, &map).await?;
        info!(
            owner_id = %owner_id,
            version = map.version,
            topics = map.topics.len(),
            "knowledge map persisted"
        );
        Ok(map)
    }

    /// The owner's current map plus staleness information, or `None`
    /// when no map has been built yet. Informational only; a stale map
    /// is not rebuilt here.
    pub async fn status(&self, owner_id: &str) -> Result<Option<KnowledgeStatus>> {
        let Some(map) = self.knowledge_store.get(owner_id).await? else {
            return Ok(None);
        };
        let current = self.notes_store.count_for_owner(owner_id).await?;
        Ok(Some(KnowledgeStatus {
            is_stale: current > map.source_count,
            current_source_count: current,
            map,
        }))
    }

    /// Reduce condensed refs to a single map.
    async fn reduce(&self, refs: &[NotesRef], progress: &dyn ProgressSink) -> Result<KnowledgeMap> {
        if refs.len() <= self.config.batch_size {
            progress.report(0.5, "Synthesizing topics").await;
            return self.synthesize_batch(refs, None).await;
        }

        let batches: Vec<&[NotesRef]> = refs.chunks(self.config.batch_size).collect();
        let total = batches.len();

        let mut queue: VecDeque<KnowledgeMap> = VecDeque::with_capacity(total);
        for (index, batch) in batches.into_iter().enumerate() {
            progress
                .report(
                    index as f32 / total as f32 * 0.7,
                    &format!("Synthesizing topic batch {}/{}", index + 1, total),
                )
                .await;
            queue.push_back(self.synthesize_batch(batch, Some((index + 1, total))).await?);
        }

        // Pairwise reduction: each round merges adjacent partials in
        // order; an odd map passes through to the next round.
        while queue.len() > 1 {
            progress.report(0.85, "Merging topic maps").await;
            let mut next = VecDeque::with_capacity(queue.len().div_ceil(2));
            while let Some(left) = queue.pop_front() {
                match queue.pop_front() {
                    Some(right) => next.push_back(self.merge_pair(&left, &right).await?),
                    None => next.push_back(left),
                }
            }
            queue = next;
        }

        Ok(queue.pop_front().unwrap_or_default())
    }

    async fn synthesize_batch(
        &self,
        refs: &[NotesRef],
        batch: Option<(usize, usize)>,
    ) -> Result<KnowledgeMap> {
        let refs_json = serde_json::to_string_pretty(refs)?;
        let prompt = knowledge_batch_prompt(&refs_json, refs.len(), batch);
        let raw = self.ai.generate(&prompt).await?;

        match parse_json::<KnowledgeMap>(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                error!(error = %e, "knowledge synthesis response failed to parse");
                Ok(KnowledgeMap::default())
            }
        }
    }

    async fn merge_pair(&self, left: &KnowledgeMap, right: &KnowledgeMap) -> Result<KnowledgeMap> {
        let prompt = knowledge_merge_prompt(
            &serde_json::to_string_pretty(left)?,
            &serde_json::to_string_pretty(right)?,
        );
        let raw = self.ai.generate(&prompt).await?;

        match parse_json::<KnowledgeMap>(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                // A lost merge response must not drop earlier batches;
                // fall back to a mechanical union of the two partials.
                warn!(error = %e, "merge response failed to parse, using mechanical union");
                Ok(union_maps(left, right))
            }
        }
    }
}

/// Mechanical union of two partial maps: topics dedupe by case-folded
/// name (facts by text, source ids by value, importance by max),
/// connections by their full triple.
pub fn union_maps(left: &KnowledgeMap, right: &KnowledgeMap) -> KnowledgeMap {
    let mut topics: IndexMap<String, Topic> = IndexMap::new();
    for topic in left.topics.iter().chain(right.topics.iter()) {
        let key = topic.name.trim().to_lowercase();
        match topics.entry(key) {
            indexmap::map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                for fact in &topic.facts {
                    if !existing
                        .facts
                        .iter()
                        .any(|f| f.fact.eq_ignore_ascii_case(&fact.fact))
                    {
                        existing.facts.push(fact.clone());
                    }
                }
                for source_id in &topic.source_ids {
                    if !existing.source_ids.contains(source_id) {
                        existing.source_ids.push(source_id.clone());
                    }
                }
                for related in &topic.related_topics {
                    if !existing.related_topics.contains(related) {
                        existing.related_topics.push(related.clone());
                    }
                }
                existing.importance = existing.importance.max(topic.importance);
                if existing.description.is_empty() {
                    existing.description = topic.description.clone();
                }
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(topic.clone());
            }
        }
    }

    let mut seen = indexmap::IndexSet::new();
    let connections = left
        .connections
        .iter()
        .chain(right.connections.iter())
        .filter(|c| {
            seen.insert((
                c.from_topic.to_lowercase(),
                c.to_topic.to_lowercase(),
                c.relationship.to_lowercase(),
            ))
        })
        .cloned()
        .collect();

    KnowledgeMap {
        topics: topics.into_values().collect(),
        connections,
        source_count: 0,
        version: 0,
    }
}
