// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vocalis recall`, `vocalis remember`, and `vocalis forget`.

use colored::Colorize;
use vocalis_config::VocalisConfig;
use vocalis_core::{
    ConversationTurn, FragmentStore, ScoredFragment, Speaker, TenantScope, TurnStore,
    VocalisError,
};
use vocalis_memory::{RecordOutcome, RetrievalQuery};

use crate::services::MemoryServices;

pub async fn run_recall(
    config: &VocalisConfig,
    scope: TenantScope,
    query: String,
    top_k: Option<usize>,
) -> Result<(), VocalisError> {
    let memory = MemoryServices::open(config).await?;
    let fragments = recall(&memory, &scope, &query, top_k).await?;

    if fragments.is_empty() {
        println!("{}", "no matching memories".dimmed());
    }
    for line in fragments.iter().map(format_recall_line) {
        println!("{line}");
    }
    memory.shutdown().await
}

pub async fn recall(
    memory: &MemoryServices,
    scope: &TenantScope,
    query: &str,
    top_k: Option<usize>,
) -> Result<Vec<ScoredFragment>, VocalisError> {
    let mut request = RetrievalQuery::from_config(query, scope.clone(), &memory.config);
    if let Some(top_k) = top_k {
        request.top_k = top_k.max(1);
    }
    memory.retriever.retrieve(&request).await
}

pub async fn run_remember(
    config: &VocalisConfig,
    scope: TenantScope,
    text: String,
) -> Result<(), VocalisError> {
    let memory = MemoryServices::open(config).await?;
    let outcome = remember(&memory, &scope, &text).await?;
    println!(
        "stored {}, duplicates {}, failed {}",
        outcome.stored.to_string().green(),
        outcome.duplicates,
        outcome.failed
    );
    memory.shutdown().await
}

/// Records `text` as a user turn, with recent history as extraction context.
pub async fn remember(
    memory: &MemoryServices,
    scope: &TenantScope,
    text: &str,
) -> Result<RecordOutcome, VocalisError> {
    let history = memory
        .turns
        .recent_turns(scope, memory.config.context_turns)
        .await?;
    let turn = ConversationTurn::new(Speaker::User, text, scope.clone());
    memory.recorder.record_turn(&turn, &history).await
}

pub async fn run_forget(
    config: &VocalisConfig,
    scope: TenantScope,
    fragment_id: String,
) -> Result<(), VocalisError> {
    let memory = MemoryServices::open(config).await?;
    let removed = memory.fragments.delete_fragment(&scope, &fragment_id).await?;
    if removed {
        memory.retriever.invalidate_scope(&scope);
        println!("forgot {fragment_id}");
    } else {
        println!("{}", format!("no fragment {fragment_id} for {scope}").yellow());
    }
    memory.shutdown().await
}

fn format_recall_line(scored: &ScoredFragment) -> String {
    format!(
        "{:.3}  {}  {}",
        scored.score,
        scored.fragment.id.dimmed(),
        scored.fragment.text
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use vocalis_config::model::MemoryConfig;
    use vocalis_test_utils::{InMemoryFragmentStore, InMemoryTurnStore, MockEmbedder};

    fn services() -> MemoryServices {
        let store = Arc::new(InMemoryFragmentStore::new());
        MemoryServices::from_parts(
            Arc::new(InMemoryTurnStore::new()),
            store.clone(),
            store,
            Arc::new(MockEmbedder::new(64)),
            &MemoryConfig {
                similarity_threshold: 0.2,
                ..MemoryConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn remember_then_recall() {
        let memory = services();
        let scope = TenantScope::new("coach", "sam");

        let outcome = remember(&memory, &scope, "I grew up in Lisbon with my grandmother")
            .await
            .unwrap();
        assert_eq!(outcome.stored, 1);

        let found = recall(&memory, &scope, "where did I grow up in Lisbon", None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].fragment.text.contains("Lisbon"));
        assert_eq!(found[0].fragment.scope, scope);
    }

    #[tokio::test]
    async fn repeating_a_fact_is_deduplicated() {
        let memory = services();
        let scope = TenantScope::new("coach", "sam");
        let fact = "I grew up in Lisbon with my grandmother";

        remember(&memory, &scope, fact).await.unwrap();
        let second = remember(&memory, &scope, fact).await.unwrap();
        assert_eq!(second.stored, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(memory.fragments.count_fragments(&scope).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recall_top_k_override_is_at_least_one() {
        let memory = services();
        let scope = TenantScope::new("coach", "sam");
        remember(&memory, &scope, "I grew up in Lisbon with my grandmother")
            .await
            .unwrap();

        let found = recall(&memory, &scope, "Lisbon grandmother", Some(0))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
