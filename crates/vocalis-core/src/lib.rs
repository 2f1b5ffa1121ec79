// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Vocalis.
//!
//! Provides the error taxonomy, shared domain types, and the adapter traits
//! through which the speech pipeline and the memory subsystem talk to their
//! external collaborators (embedding client, similarity index, speech
//! provider, persistent store).

pub mod error;
pub mod traits;
pub mod types;

pub use error::VocalisError;
pub use types::{
    AdapterType, ConversationTurn, HealthStatus, MemoryFragment, ScoredFragment, Speaker,
    TenantScope, VoiceConfig, VoiceSettings,
};

pub use traits::{
    EmbeddingAdapter, FragmentStore, PluginAdapter, SimilarityIndex, SpeechAdapter, TurnStore,
};
