// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the speech pipeline and the memory subsystem.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Speech,
    SimilarityIndex,
    Storage,
    Llm,
}

/// The (avatar, user) pair that owns a piece of conversational memory.
///
/// Every fragment and turn carries one. Reads and writes are always filtered
/// on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub avatar_id: String,
    pub user_id: String,
}

impl TenantScope {
    pub fn new(avatar_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            avatar_id: avatar_id.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.avatar_id, self.user_id)
    }
}

/// Who said a conversational turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Avatar,
}

/// A single recorded message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    pub scope: TenantScope,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn stamped with a fresh id and the current time.
    pub fn new(speaker: Speaker, text: impl Into<String>, scope: TenantScope) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker,
            text: text.into(),
            scope,
            timestamp: Utc::now(),
        }
    }
}

/// A persisted unit of extracted personal memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub id: String,
    pub text: String,
    /// Embedding vector; empty until attached before persistence.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub scope: TenantScope,
    /// Memory-worthiness score assigned by the extractor, in [0, 1].
    pub extraction_score: f32,
    /// Id of the turn this fragment was extracted from.
    pub extracted_from: String,
    pub created_at: DateTime<Utc>,
}

/// A fragment returned by retrieval together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    pub fragment: MemoryFragment,
    /// Cosine similarity in [0, 1].
    pub score: f32,
}

/// One row of a similarity index response.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub fragment_id: String,
    pub score: f32,
}

/// Provider voice tuning, passed through to the speech provider unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// Caller-supplied voice selection for a synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub voice_id: String,
    pub settings: VoiceSettings,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter. One vector per input text, same order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// A single synthesis call.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceConfig,
}

/// Audio returned by a speech provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub bytes: Bytes,
    /// MIME type reported by the provider, e.g. `audio/mpeg`.
    pub content_type: String,
    /// Approximate playback length, when the provider reports one.
    pub duration_hint: Option<Duration>,
}
