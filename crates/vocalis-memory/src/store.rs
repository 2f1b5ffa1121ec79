// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed fragment store and tenant-scoped similarity index.
//!
//! Every statement that reads fragments binds both `avatar_id` and `user_id`.
//! Similarity is computed in Rust over the scope's embeddings only.

use std::cmp::Ordering;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use vocalis_core::types::SimilarityHit;
use vocalis_core::{
    AdapterType, FragmentStore, HealthStatus, MemoryFragment, PluginAdapter, SimilarityIndex,
    TenantScope, VocalisError,
};
use vocalis_storage::{format_timestamp, map_tr_err, parse_timestamp, Database};

use crate::types::{blob_to_vec, cosine_similarity, vec_to_blob};

/// Persistent store for memory fragments in the `fragments` table.
pub struct SqliteFragmentStore {
    db: Database,
}

impl SqliteFragmentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn row_to_fragment(row: &rusqlite::Row<'_>) -> Result<MemoryFragment, rusqlite::Error> {
    let blob: Vec<u8> = row.get(4)?;
    let created_at: String = row.get(7)?;
    Ok(MemoryFragment {
        id: row.get(0)?,
        scope: TenantScope::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
        text: row.get(3)?,
        embedding: blob_to_vec(&blob),
        extraction_score: row.get::<_, f64>(5)? as f32,
        extracted_from: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
    })
}

#[async_trait]
impl PluginAdapter for SqliteFragmentStore {
    fn name(&self) -> &str {
        "sqlite-fragments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        self.db.ping().await?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FragmentStore for SqliteFragmentStore {
    async fn save_fragment(&self, fragment: &MemoryFragment) -> Result<(), VocalisError> {
        let id = fragment.id.clone();
        let avatar_id = fragment.scope.avatar_id.clone();
        let user_id = fragment.scope.user_id.clone();
        let text = fragment.text.clone();
        let embedding = vec_to_blob(&fragment.embedding);
        let score = f64::from(fragment.extraction_score);
        let turn_id = fragment.extracted_from.clone();
        let created_at = format_timestamp(&fragment.created_at);

        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO fragments (id, avatar_id, user_id, text, embedding, extraction_score, turn_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![id, avatar_id, user_id, text, embedding, score, turn_id, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_fragments(
        &self,
        scope: &TenantScope,
        ids: &[String],
    ) -> Result<Vec<MemoryFragment>, VocalisError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let scope = scope.clone();
        let ids = ids.to_vec();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, avatar_id, user_id, text, embedding, extraction_score, turn_id, created_at
                     FROM fragments WHERE avatar_id = ?1 AND user_id = ?2 AND id = ?3",
                )?;
                let mut fragments = Vec::with_capacity(ids.len());
                for id in &ids {
                    if let Some(fragment) = stmt
                        .query_row(params![scope.avatar_id, scope.user_id, id], row_to_fragment)
                        .optional()?
                    {
                        fragments.push(fragment);
                    }
                }
                Ok(fragments)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn delete_fragment(&self, scope: &TenantScope, id: &str) -> Result<bool, VocalisError> {
        let scope = scope.clone();
        let id = id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM fragments WHERE avatar_id = ?1 AND user_id = ?2 AND id = ?3",
                    params![scope.avatar_id, scope.user_id, id],
                )?;
                Ok(removed > 0)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn count_fragments(&self, scope: &TenantScope) -> Result<usize, VocalisError> {
        let scope = scope.clone();
        self.db
            .connection()
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM fragments WHERE avatar_id = ?1 AND user_id = ?2",
                    params![scope.avatar_id, scope.user_id],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl SimilarityIndex for SqliteFragmentStore {
    async fn search(
        &self,
        vector: &[f32],
        scope: &TenantScope,
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<SimilarityHit>, VocalisError> {
        if top_k == 0 {
            return Ok(vec![]);
        }
        let scope = scope.clone();
        let rows = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, embedding, created_at FROM fragments
                     WHERE avatar_id = ?1 AND user_id = ?2",
                )?;
                let rows = stmt
                    .query_map(params![scope.avatar_id, scope.user_id], |row| {
                        let id: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        let created_at: String = row.get(2)?;
                        Ok((id, blob_to_vec(&blob), created_at))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut scored: Vec<(String, f32, String)> = rows
            .into_iter()
            .map(|(id, embedding, created_at)| {
                let score = cosine_similarity(vector, &embedding).clamp(0.0, 1.0);
                (id, score, created_at)
            })
            .filter(|(_, score, _)| *score >= threshold)
            .collect();

        // Score descending, then newest first. Timestamps are fixed-width RFC 3339.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.2.cmp(&a.2))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(fragment_id, score, _)| SimilarityHit { fragment_id, score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    async fn store() -> SqliteFragmentStore {
        SqliteFragmentStore::new(Database::open_in_memory().await.unwrap())
    }

    fn fragment(id: &str, scope: &TenantScope, embedding: Vec<f32>, secs: i64) -> MemoryFragment {
        MemoryFragment {
            id: id.to_string(),
            text: format!("fragment {id}"),
            embedding,
            scope: scope.clone(),
            extraction_score: 0.8,
            extracted_from: "turn-1".to_string(),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let store = store().await;
        let scope = TenantScope::new("grandma", "alice");
        let original = fragment("f1", &scope, vec![0.1, 0.2, 0.3], 0);
        store.save_fragment(&original).await.unwrap();

        let loaded = store
            .get_fragments(&scope, &["f1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(loaded, vec![original]);
    }

    #[tokio::test]
    async fn get_fragments_never_crosses_scope() {
        let store = store().await;
        let alice = TenantScope::new("grandma", "alice");
        let bob = TenantScope::new("grandma", "bob");
        store
            .save_fragment(&fragment("f1", &alice, vec![1.0, 0.0], 0))
            .await
            .unwrap();

        let leaked = store.get_fragments(&bob, &["f1".to_string()]).await.unwrap();
        assert!(leaked.is_empty());
        assert!(!store.delete_fragment(&bob, "f1").await.unwrap());
        assert_eq!(store.count_fragments(&alice).await.unwrap(), 1);
        assert!(store.delete_fragment(&alice, "f1").await.unwrap());
        assert_eq!(store.count_fragments(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_orders_by_score_then_recency() {
        let store = store().await;
        let scope = TenantScope::new("grandma", "alice");
        store
            .save_fragment(&fragment("old-exact", &scope, vec![1.0, 0.0], 0))
            .await
            .unwrap();
        store
            .save_fragment(&fragment("new-exact", &scope, vec![2.0, 0.0], 60))
            .await
            .unwrap();
        store
            .save_fragment(&fragment("close", &scope, vec![0.9, 0.3], 30))
            .await
            .unwrap();
        store
            .save_fragment(&fragment("far", &scope, vec![0.0, 1.0], 90))
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], &scope, 0.5, 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.fragment_id.as_str()).collect();
        assert_eq!(ids, vec!["new-exact", "old-exact", "close"]);
        assert!(hits.iter().all(|h| h.score >= 0.5 && h.score <= 1.0));

        let top1 = store.search(&[1.0, 0.0], &scope, 0.0, 1).await.unwrap();
        assert_eq!(top1.len(), 1);
    }

    #[tokio::test]
    async fn search_only_sees_own_scope() {
        let store = store().await;
        let alice = TenantScope::new("grandma", "alice");
        let other_avatar = TenantScope::new("grandpa", "alice");
        store
            .save_fragment(&fragment("f1", &alice, vec![1.0, 0.0], 0))
            .await
            .unwrap();

        assert!(store
            .search(&[1.0, 0.0], &other_avatar, 0.0, 5)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn negative_similarity_clamps_to_zero() {
        let store = store().await;
        let scope = TenantScope::new("grandma", "alice");
        store
            .save_fragment(&fragment("opposite", &scope, vec![-1.0, 0.0], 0))
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], &scope, 0.0, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
    }
}
