// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Vocalis.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vocalis_core::{VoiceConfig, VoiceSettings};

/// Top-level Vocalis configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VocalisConfig {
    /// Avatar identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Streaming speech pipeline tuning.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Semantic memory retrieval and extraction.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI-compatible embedding and chat endpoint.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// ElevenLabs-compatible speech provider.
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,
}

/// Avatar identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the avatar.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Persona prompt prepended to every chat request.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "vocalis".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Streaming speech pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// Maximum simultaneous speech provider calls.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-sentence deadline for a synthesis call, in seconds.
    #[serde(default = "default_sentence_timeout_secs")]
    pub sentence_timeout_secs: u64,

    /// Maximum completed-but-undelivered results held for reordering.
    #[serde(default = "default_reorder_capacity")]
    pub reorder_capacity: usize,

    /// A sentence must contain strictly more than this many non-whitespace characters.
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
}

impl SpeechConfig {
    pub fn sentence_timeout(&self) -> Duration {
        Duration::from_secs(self.sentence_timeout_secs)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            sentence_timeout_secs: default_sentence_timeout_secs(),
            reorder_capacity: default_reorder_capacity(),
            min_sentence_chars: default_min_sentence_chars(),
        }
    }
}

fn default_max_concurrency() -> usize {
    3
}

fn default_sentence_timeout_secs() -> u64 {
    15
}

fn default_reorder_capacity() -> usize {
    6
}

fn default_min_sentence_chars() -> usize {
    5
}

/// Memory system configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Minimum cosine similarity for a fragment to be retrieved.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum fragments returned per retrieval.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Lifetime of cached retrieval results, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Minimum memory-worthiness score for an extracted span.
    #[serde(default = "default_extraction_threshold")]
    pub extraction_threshold: f32,

    /// Similarity above which a candidate is treated as already stored.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,

    /// Number of preceding turns handed to the extractor as context.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
}

impl MemoryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
            cache_ttl_secs: default_cache_ttl_secs(),
            extraction_threshold: default_extraction_threshold(),
            dedup_threshold: default_dedup_threshold(),
            context_turns: default_context_turns(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.75
}

fn default_top_k() -> usize {
    5
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_extraction_threshold() -> f32 {
    0.5
}

fn default_dedup_threshold() -> f32 {
    0.92
}

fn default_context_turns() -> usize {
    6
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vocalis").join("vocalis.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "vocalis.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// OpenAI-compatible API configuration (embeddings + chat streaming).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` requires the `VOCALIS_OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL, without trailing slash.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for fragment and query embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model used for avatar replies.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Maximum tokens generated per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// ElevenLabs-compatible speech provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ElevenLabsConfig {
    /// API key. `None` requires the `VOCALIS_ELEVENLABS_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL, without trailing slash.
    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,

    /// Voice to synthesize with.
    #[serde(default)]
    pub voice_id: Option<String>,

    /// Synthesis model identifier.
    #[serde(default = "default_tts_model")]
    pub model_id: String,

    /// Audio encoding requested from the provider.
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_use_speaker_boost")]
    pub use_speaker_boost: bool,
}

impl ElevenLabsConfig {
    /// Voice selection for synthesis requests, if a voice is configured.
    pub fn voice(&self) -> Option<VoiceConfig> {
        self.voice_id.as_ref().map(|voice_id| VoiceConfig {
            voice_id: voice_id.clone(),
            settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
                style: self.style,
                use_speaker_boost: self.use_speaker_boost,
            },
        })
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_elevenlabs_base_url(),
            voice_id: None,
            model_id: default_tts_model(),
            output_format: default_output_format(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: default_use_speaker_boost(),
        }
    }
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_tts_model() -> String {
    "eleven_turbo_v2_5".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_use_speaker_boost() -> bool {
    true
}
