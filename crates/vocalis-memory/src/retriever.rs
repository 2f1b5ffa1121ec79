// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory retrieval engine: embed, scoped similarity search, isolation check, cache.
//!
//! Retrieval is best-effort. Embedding, index, and store failures degrade to
//! an empty result. The one failure that always surfaces is an isolation
//! violation: a fragment whose scope differs from the query's is never
//! returned, cached, or silently dropped.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};
use vocalis_core::{
    EmbeddingAdapter, FragmentStore, ScoredFragment, SimilarityIndex, TenantScope, VocalisError,
};

use crate::cache::{retrieval_key, scope_prefix, TtlCache};
use crate::types::RetrievalQuery;

/// Answers "what does this avatar know about X for this user".
pub struct MemoryRetriever {
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn SimilarityIndex>,
    store: Arc<dyn FragmentStore>,
    cache: TtlCache<CachedRetrieval>,
}

/// A cached result together with the limits it was computed under.
#[derive(Clone)]
struct CachedRetrieval {
    threshold: f32,
    top_k: usize,
    results: Vec<ScoredFragment>,
}

impl CachedRetrieval {
    /// The answer for `query`, if it is no looser and no larger than this entry.
    ///
    /// Results are sorted by score, so for a stricter threshold the matching
    /// fragments are a prefix of the cached list.
    fn serve(&self, query: &RetrievalQuery) -> Option<Vec<ScoredFragment>> {
        if query.threshold < self.threshold || query.top_k > self.top_k {
            return None;
        }
        Some(
            self.results
                .iter()
                .filter(|r| r.score >= query.threshold)
                .take(query.top_k)
                .cloned()
                .collect(),
        )
    }
}

impl MemoryRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingAdapter>,
        index: Arc<dyn SimilarityIndex>,
        store: Arc<dyn FragmentStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Fragments relevant to `query`, highest score first, newest first on ties.
    ///
    /// Results are cached per (query text, avatar, user) for the configured TTL.
    /// A cached entry answers only queries at least as strict as the one that
    /// built it; a looser threshold or larger `top_k` searches again.
    /// Returns `Err` only for [`VocalisError::IsolationViolation`].
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
    ) -> Result<Vec<ScoredFragment>, VocalisError> {
        let key = retrieval_key(&query.scope, &query.query_text);
        if let Some(cached) = self.cache.get(&key).and_then(|entry| entry.serve(query)) {
            metrics::counter!("vocalis_retrieval_cache_total", "result" => "hit").increment(1);
            debug!(
                avatar_id = %query.scope.avatar_id,
                user_id = %query.scope.user_id,
                results = cached.len(),
                "memory retrieval cache hit"
            );
            return Ok(cached);
        }
        metrics::counter!("vocalis_retrieval_cache_total", "result" => "miss").increment(1);

        let vector = match self.embedder.embed_one(&query.query_text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, avatar_id = %query.scope.avatar_id, "query embedding failed, continuing without memories");
                return Ok(vec![]);
            }
        };

        let results = match self
            .search_by_vector(&vector, &query.scope, query.threshold, query.top_k)
            .await
        {
            Ok(results) => results,
            Err(e @ VocalisError::IsolationViolation { .. }) => return Err(e),
            Err(e) => {
                warn!(error = %e, avatar_id = %query.scope.avatar_id, "similarity search failed, continuing without memories");
                return Ok(vec![]);
            }
        };

        self.cache.insert(
            key,
            CachedRetrieval {
                threshold: query.threshold,
                top_k: query.top_k,
                results: results.clone(),
            },
        );
        Ok(results)
    }

    /// Uncached scoped search for an already-embedded vector.
    ///
    /// Propagates every failure, so callers deciding whether to write (the
    /// duplicate pre-check) can tell "nothing similar" from "could not check".
    pub async fn search_by_vector(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<ScoredFragment>, VocalisError> {
        let hits = self.index.search(vector, scope, threshold, top_k).await?;
        if hits.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = hits.iter().map(|h| h.fragment_id.clone()).collect();
        let fragments = self.store.get_fragments(scope, &ids).await?;

        if let Some(foreign) = fragments.iter().find(|f| f.scope != *scope) {
            metrics::counter!("vocalis_isolation_violations_total").increment(1);
            error!(
                expected = %scope,
                found = %foreign.scope,
                fragment_id = %foreign.id,
                "store returned a fragment outside the query scope; rejecting response"
            );
            return Err(VocalisError::IsolationViolation {
                expected: scope.to_string(),
                found: foreign.scope.to_string(),
            });
        }

        let mut by_id: HashMap<String, _> =
            fragments.into_iter().map(|f| (f.id.clone(), f)).collect();
        let mut results: Vec<ScoredFragment> = hits
            .into_iter()
            .filter(|hit| hit.score >= threshold)
            .filter_map(|hit| {
                by_id.remove(&hit.fragment_id).map(|fragment| ScoredFragment {
                    fragment,
                    score: hit.score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.fragment.created_at.cmp(&a.fragment.created_at))
        });
        results.truncate(top_k);
        Ok(results)
    }

    /// Drops every cached retrieval for `scope`. Returns the number of entries removed.
    pub fn invalidate_scope(&self, scope: &TenantScope) -> usize {
        self.cache.invalidate_prefix(&scope_prefix(scope))
    }

    /// Evicts expired cache entries.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}
