// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-specific types and vector helpers.

use chrono::{DateTime, Utc};
use vocalis_config::model::MemoryConfig;
use vocalis_core::{MemoryFragment, TenantScope};

/// A transient request for relevant memories.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub query_text: String,
    pub scope: TenantScope,
    /// Minimum score in [0, 1].
    pub threshold: f32,
    pub top_k: usize,
}

impl RetrievalQuery {
    /// Builds a query using the configured threshold and result limit.
    pub fn from_config(
        query_text: impl Into<String>,
        scope: TenantScope,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            query_text: query_text.into(),
            scope,
            threshold: config.similarity_threshold,
            top_k: config.top_k,
        }
    }
}

/// A memory-worthy span found by the extractor, not yet embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentCandidate {
    pub text: String,
    /// Memory-worthiness in [0, 1].
    pub score: f32,
    pub scope: TenantScope,
    /// Id of the originating conversation turn.
    pub turn_id: String,
    /// Timestamp of the originating conversation turn.
    pub extracted_at: DateTime<Utc>,
}

impl FragmentCandidate {
    /// Attaches an embedding, producing a fragment ready for persistence.
    ///
    /// The fragment is dated by its originating turn, not by when it was stored.
    pub fn into_fragment(self, embedding: Vec<f32>) -> MemoryFragment {
        MemoryFragment {
            id: uuid::Uuid::new_v4().to_string(),
            text: self.text,
            embedding,
            scope: self.scope,
            extraction_score: self.score,
            extracted_from: self.turn_id,
            created_at: self.extracted_at,
        }
    }
}

/// Convert f32 vector to SQLite BLOB (little-endian bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude input rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
