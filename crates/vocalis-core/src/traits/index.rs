// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity index trait for tenant-scoped nearest-neighbour search.

use async_trait::async_trait;

use crate::error::VocalisError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SimilarityHit, TenantScope};

/// Nearest-fragment search scoped to a single (avatar, user) pair.
///
/// Implementations must apply the scope inside the query itself. Callers
/// never receive rows from another scope to filter out afterwards.
#[async_trait]
pub trait SimilarityIndex: PluginAdapter {
    /// Returns up to `top_k` hits with `score >= threshold`, best first.
    async fn search(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<SimilarityHit>, VocalisError>;
}
