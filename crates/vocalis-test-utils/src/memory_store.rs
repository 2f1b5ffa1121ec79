// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory fragment and turn stores.
//!
//! `InMemoryFragmentStore` can be switched into a faulty mode that ignores
//! the scope on reads and reports foreign fragments from its index, so the
//! retrieval engine's isolation check can be exercised.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use vocalis_core::types::SimilarityHit;
use vocalis_core::{
    AdapterType, ConversationTurn, FragmentStore, HealthStatus, MemoryFragment, PluginAdapter,
    SimilarityIndex, TenantScope, TurnStore, VocalisError,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[derive(Default)]
pub struct InMemoryFragmentStore {
    fragments: Mutex<Vec<MemoryFragment>>,
    aliases: Mutex<Vec<(TenantScope, String)>>,
    ignore_scope_on_read: bool,
    search_failing: AtomicBool,
}

impl InMemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_fragments` returns matching ids from any scope.
    pub fn ignoring_scope_on_read(mut self) -> Self {
        self.ignore_scope_on_read = true;
        self
    }

    /// Makes `search` in `scope` also report the fragment `id`, whoever owns it.
    pub fn index_as(&self, scope: &TenantScope, id: &str) {
        lock(&self.aliases).push((scope.clone(), id.to_string()));
    }

    /// Makes every subsequent `search` fail with a storage error.
    pub fn set_search_failing(&self, failing: bool) {
        self.search_failing.store(failing, AtomicOrdering::SeqCst);
    }

    /// Every stored fragment, in insertion order.
    pub fn all(&self) -> Vec<MemoryFragment> {
        lock(&self.fragments).clone()
    }
}

#[async_trait]
impl PluginAdapter for InMemoryFragmentStore {
    fn name(&self) -> &str {
        "memory-fragments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FragmentStore for InMemoryFragmentStore {
    async fn save_fragment(&self, fragment: &MemoryFragment) -> Result<(), VocalisError> {
        lock(&self.fragments).push(fragment.clone());
        Ok(())
    }

    async fn get_fragments(
        &self,
        scope: &TenantScope,
        ids: &[String],
    ) -> Result<Vec<MemoryFragment>, VocalisError> {
        let fragments = lock(&self.fragments);
        Ok(ids
            .iter()
            .filter_map(|id| {
                fragments
                    .iter()
                    .find(|f| &f.id == id && (self.ignore_scope_on_read || f.scope == *scope))
                    .cloned()
            })
            .collect())
    }

    async fn delete_fragment(&self, scope: &TenantScope, id: &str) -> Result<bool, VocalisError> {
        let mut fragments = lock(&self.fragments);
        let before = fragments.len();
        fragments.retain(|f| !(f.id == id && f.scope == *scope));
        Ok(fragments.len() != before)
    }

    async fn count_fragments(&self, scope: &TenantScope) -> Result<usize, VocalisError> {
        Ok(lock(&self.fragments)
            .iter()
            .filter(|f| f.scope == *scope)
            .count())
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryFragmentStore {
    async fn search(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<SimilarityHit>, VocalisError> {
        if self.search_failing.load(AtomicOrdering::SeqCst) {
            return Err(VocalisError::Storage {
                source: "similarity index unavailable".into(),
            });
        }
        let aliases = lock(&self.aliases);
        let fragments = lock(&self.fragments);
        let mut scored: Vec<(&MemoryFragment, f32)> = fragments
            .iter()
            .filter(|f| {
                f.scope == *scope || aliases.iter().any(|(s, id)| s == scope && *id == f.id)
            })
            .map(|f| (f, cosine(vector, &f.embedding).clamp(0.0, 1.0)))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        });
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(f, score)| SimilarityHit {
                fragment_id: f.id.clone(),
                score,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTurnStore {
    turns: Mutex<Vec<ConversationTurn>>,
}

impl InMemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for InMemoryTurnStore {
    fn name(&self) -> &str {
        "memory-turns"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), VocalisError> {
        lock(&self.turns).push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        scope: &TenantScope,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, VocalisError> {
        let turns = lock(&self.turns);
        let scoped: Vec<&ConversationTurn> = turns.iter().filter(|t| t.scope == *scope).collect();
        let skip = scoped.len().saturating_sub(limit);
        Ok(scoped.into_iter().skip(skip).cloned().collect())
    }
}
