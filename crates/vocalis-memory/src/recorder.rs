// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persists conversation turns and the memory fragments extracted from them.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vocalis_config::model::MemoryConfig;
use vocalis_core::types::EmbeddingInput;
use vocalis_core::{ConversationTurn, EmbeddingAdapter, FragmentStore, TurnStore, VocalisError};

use crate::extractor::FragmentExtractor;
use crate::retriever::MemoryRetriever;
use crate::types::cosine_similarity;

/// Counts from one [`MemoryRecorder::record_turn`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Fragments written to the store.
    pub stored: usize,
    /// Candidates skipped because a near-identical fragment already exists
    /// or was stored earlier from the same turn.
    pub duplicates: usize,
    /// Candidates that could not be embedded or saved.
    pub failed: usize,
}

/// Runs extract, embed, duplicate pre-check, persist for each recorded turn.
pub struct MemoryRecorder {
    turns: Arc<dyn TurnStore>,
    fragments: Arc<dyn FragmentStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    retriever: Arc<MemoryRetriever>,
    extractor: FragmentExtractor,
    extraction_threshold: f32,
    dedup_threshold: f32,
}

impl MemoryRecorder {
    pub fn new(
        turns: Arc<dyn TurnStore>,
        fragments: Arc<dyn FragmentStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        retriever: Arc<MemoryRetriever>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            turns,
            fragments,
            embedder,
            retriever,
            extractor: FragmentExtractor::new(),
            extraction_threshold: config.extraction_threshold,
            dedup_threshold: config.dedup_threshold,
        }
    }

    /// Saves `turn` and stores any new memory fragments it contains.
    ///
    /// Only a failure to save the turn itself, or an isolation violation
    /// during the duplicate check, is returned as an error. Extraction
    /// problems are logged and counted in the outcome.
    pub async fn record_turn(
        &self,
        turn: &ConversationTurn,
        context: &[ConversationTurn],
    ) -> Result<RecordOutcome, VocalisError> {
        self.turns.save_turn(turn).await?;

        let mut outcome = RecordOutcome::default();
        let candidates = self
            .extractor
            .extract(turn, context, self.extraction_threshold);
        if candidates.is_empty() {
            return Ok(outcome);
        }

        let texts = candidates.iter().map(|c| c.text.clone()).collect();
        let embeddings = match self.embedder.embed(EmbeddingInput { texts }).await {
            Ok(output) if output.embeddings.len() == candidates.len() => output.embeddings,
            Ok(output) => {
                warn!(
                    expected = candidates.len(),
                    got = output.embeddings.len(),
                    "embedding count mismatch, dropping candidates"
                );
                outcome.failed = candidates.len();
                return Ok(outcome);
            }
            Err(e) => {
                warn!(error = %e, turn_id = %turn.id, "candidate embedding failed, turn recorded without fragments");
                outcome.failed = candidates.len();
                return Ok(outcome);
            }
        };

        // Embeddings stored from this turn. Checked locally so repeats are
        // caught even when the index pre-check below is unavailable.
        let mut accepted: Vec<Vec<f32>> = Vec::new();
        for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
            if accepted
                .iter()
                .any(|prior| cosine_similarity(prior, &embedding) >= self.dedup_threshold)
            {
                debug!(turn_id = %turn.id, "skipping span repeated within the turn");
                outcome.duplicates += 1;
                continue;
            }

            match self
                .retriever
                .search_by_vector(&embedding, &candidate.scope, self.dedup_threshold, 1)
                .await
            {
                Ok(existing) if !existing.is_empty() => {
                    debug!(
                        fragment_id = %existing[0].fragment.id,
                        score = existing[0].score,
                        "skipping near-duplicate fragment"
                    );
                    outcome.duplicates += 1;
                    continue;
                }
                Ok(_) => {}
                Err(e @ VocalisError::IsolationViolation { .. }) => return Err(e),
                Err(e) => {
                    // Unverified, but losing a memory is worse than a possible duplicate.
                    warn!(error = %e, "duplicate pre-check failed, storing fragment anyway");
                }
            }

            let fragment = candidate.into_fragment(embedding);
            match self.fragments.save_fragment(&fragment).await {
                Ok(()) => {
                    metrics::counter!("vocalis_fragments_stored_total").increment(1);
                    outcome.stored += 1;
                    accepted.push(fragment.embedding);
                }
                Err(e) => {
                    warn!(error = %e, fragment_id = %fragment.id, "failed to store fragment");
                    outcome.failed += 1;
                }
            }
        }

        if outcome.stored > 0 {
            self.retriever.invalidate_scope(&turn.scope);
            info!(
                avatar_id = %turn.scope.avatar_id,
                user_id = %turn.scope.user_id,
                stored = outcome.stored,
                duplicates = outcome.duplicates,
                "memory fragments recorded"
            );
        }
        Ok(outcome)
    }
}
