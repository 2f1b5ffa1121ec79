// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the TurnStore trait.

use std::str::FromStr;

use async_trait::async_trait;
use rusqlite::params;
use vocalis_core::{
    AdapterType, ConversationTurn, HealthStatus, PluginAdapter, Speaker, TenantScope, TurnStore,
    VocalisError,
};

use crate::database::{format_timestamp, map_tr_err, parse_timestamp, Database};

/// Conversation history persisted in the `turns` table.
pub struct SqliteTurnStore {
    db: Database,
}

impl SqliteTurnStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PluginAdapter for SqliteTurnStore {
    fn name(&self) -> &str {
        "sqlite-turns"
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

    async fn shutdown(&self) -> Result<(), VocalisError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl TurnStore for SqliteTurnStore {
    async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), VocalisError> {
        let id = turn.id.clone();
        let avatar_id = turn.scope.avatar_id.clone();
        let user_id = turn.scope.user_id.clone();
        let speaker = turn.speaker.to_string();
        let text = turn.text.clone();
        let created_at = format_timestamp(&turn.timestamp);

        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO turns (id, avatar_id, user_id, speaker, text, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![id, avatar_id, user_id, speaker, text, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn recent_turns(
        &self,
        scope: &TenantScope,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, VocalisError> {
        let scope = scope.clone();
        let mut turns = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, speaker, text, created_at FROM turns
                     WHERE avatar_id = ?1 AND user_id = ?2
                     ORDER BY created_at DESC, rowid DESC LIMIT ?3",
                )?;
                let rows = stmt
                    .query_map(
                        params![scope.avatar_id, scope.user_id, limit as i64],
                        |row| {
                            let speaker: String = row.get(1)?;
                            let created_at: String = row.get(3)?;
                            Ok(ConversationTurn {
                                id: row.get(0)?,
                                speaker: Speaker::from_str(&speaker).map_err(|e| {
                                    rusqlite::Error::FromSqlConversionFailure(
                                        1,
                                        rusqlite::types::Type::Text,
                                        Box::new(e),
                                    )
                                })?,
                                text: row.get(2)?,
                                scope: scope.clone(),
                                timestamp: parse_timestamp(3, &created_at)?,
                            })
                        },
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        turns.reverse();
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteTurnStore {
        SqliteTurnStore::new(Database::open_in_memory().await.unwrap())
    }

    fn turn_at(speaker: Speaker, text: &str, scope: &TenantScope, secs: i64) -> ConversationTurn {
        let mut turn = ConversationTurn::new(speaker, text, scope.clone());
        turn.timestamp = chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap();
        turn
    }

    #[tokio::test]
    async fn recent_turns_are_oldest_first_and_limited() {
        let store = store().await;
        let scope = TenantScope::new("grandma", "alice");
        for (i, text) in ["one", "two", "three", "four"].iter().enumerate() {
            store
                .save_turn(&turn_at(Speaker::User, text, &scope, i as i64))
                .await
                .unwrap();
        }

        let turns = store.recent_turns(&scope, 2).await.unwrap();
        let texts: Vec<&str> = turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "four"]);
    }

    #[tokio::test]
    async fn turns_are_scoped_per_avatar_and_user() {
        let store = store().await;
        let alice = TenantScope::new("grandma", "alice");
        let bob = TenantScope::new("grandma", "bob");
        let other_avatar = TenantScope::new("grandpa", "alice");

        store
            .save_turn(&turn_at(Speaker::User, "alice speaking", &alice, 0))
            .await
            .unwrap();
        store
            .save_turn(&turn_at(Speaker::Avatar, "to bob", &bob, 1))
            .await
            .unwrap();

        let turns = store.recent_turns(&alice, 10).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[0].scope, alice);

        assert!(store.recent_turns(&other_avatar, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let store = store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
