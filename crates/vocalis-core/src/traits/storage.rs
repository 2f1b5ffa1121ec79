// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for memory fragments and conversation turns.

use async_trait::async_trait;

use crate::error::VocalisError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationTurn, MemoryFragment, TenantScope};

/// Persistent storage for memory fragments.
///
/// Every read takes a [`TenantScope`]; there is no unscoped lookup.
#[async_trait]
pub trait FragmentStore: PluginAdapter {
    /// Persists a fragment. The fragment must already carry its embedding.
    async fn save_fragment(&self, fragment: &MemoryFragment) -> Result<(), VocalisError>;

    /// Loads fragments by id, restricted to `scope`. Unknown ids are skipped.
    async fn get_fragments(
        &self,
        scope: &TenantScope,
        ids: &[String],
    ) -> Result<Vec<MemoryFragment>, VocalisError>;

    /// Deletes a fragment owned by `scope`. Returns whether a row was removed.
    async fn delete_fragment(&self, scope: &TenantScope, id: &str) -> Result<bool, VocalisError>;

    /// Number of fragments owned by `scope`.
    async fn count_fragments(&self, scope: &TenantScope) -> Result<usize, VocalisError>;
}

/// Persistent storage for conversation turns.
#[async_trait]
pub trait TurnStore: PluginAdapter {
    /// Records a turn.
    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), VocalisError>;

    /// Most recent turns for `scope`, oldest first, at most `limit`.
    async fn recent_turns(
        &self,
        scope: &TenantScope,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, VocalisError>;
}
