// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the memory subsystem and speech pipeline from config.

use std::sync::Arc;

use tracing::info;
use vocalis_config::VocalisConfig;
use vocalis_config::model::MemoryConfig;
use vocalis_core::{
    EmbeddingAdapter, FragmentStore, PluginAdapter, SimilarityIndex, SpeechAdapter, TurnStore,
    VocalisError, VoiceConfig,
};
use vocalis_elevenlabs::ElevenLabsSpeech;
use vocalis_memory::{MemoryRecorder, MemoryRetriever, SqliteFragmentStore};
use vocalis_openai::OpenAiEmbedder;
use vocalis_speech::SpeechPipeline;
use vocalis_storage::SqliteTurnStore;

/// Everything that reads or writes a tenant's conversational memory.
pub struct MemoryServices {
    pub turns: Arc<dyn TurnStore>,
    pub fragments: Arc<dyn FragmentStore>,
    pub retriever: Arc<MemoryRetriever>,
    pub recorder: MemoryRecorder,
    pub config: MemoryConfig,
}

impl MemoryServices {
    /// Opens the SQLite database and builds the OpenAI-backed memory stack.
    pub async fn open(config: &VocalisConfig) -> Result<Self, VocalisError> {
        let db = vocalis_storage::open_from_config(&config.storage).await?;
        info!(path = %config.storage.database_path, "database opened");

        let turns: Arc<dyn TurnStore> = Arc::new(SqliteTurnStore::new(db.clone()));
        let store = Arc::new(SqliteFragmentStore::new(db));
        let embedder: Arc<dyn EmbeddingAdapter> = Arc::new(OpenAiEmbedder::new(&config.openai)?);

        Ok(Self::from_parts(
            turns,
            store.clone(),
            store,
            embedder,
            &config.memory,
        ))
    }

    pub fn from_parts(
        turns: Arc<dyn TurnStore>,
        fragments: Arc<dyn FragmentStore>,
        index: Arc<dyn SimilarityIndex>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: &MemoryConfig,
    ) -> Self {
        let retriever = Arc::new(MemoryRetriever::new(
            embedder.clone(),
            index,
            fragments.clone(),
            config.cache_ttl(),
        ));
        let recorder = MemoryRecorder::new(
            turns.clone(),
            fragments.clone(),
            embedder,
            retriever.clone(),
            config,
        );
        Self {
            turns,
            fragments,
            retriever,
            recorder,
            config: config.clone(),
        }
    }

    /// Releases adapter resources (WAL checkpoint on the SQLite stores).
    pub async fn shutdown(&self) -> Result<(), VocalisError> {
        self.turns.shutdown().await?;
        self.fragments.shutdown().await
    }
}

/// Voice from `--voice` when given, otherwise from `[elevenlabs]`.
pub fn resolve_voice(
    config: &VocalisConfig,
    voice_override: Option<&str>,
) -> Result<VoiceConfig, VocalisError> {
    let mut elevenlabs = config.elevenlabs.clone();
    if let Some(voice_id) = voice_override {
        elevenlabs.voice_id = Some(voice_id.to_string());
    }
    elevenlabs.voice().ok_or_else(|| {
        VocalisError::Config("no voice configured. Set elevenlabs.voice_id or pass --voice".into())
    })
}

/// Speech pipeline over the configured ElevenLabs provider.
pub fn speech_pipeline(
    config: &VocalisConfig,
    voice_override: Option<&str>,
) -> Result<SpeechPipeline, VocalisError> {
    let voice = resolve_voice(config, voice_override)?;
    let speech: Arc<dyn SpeechAdapter> = Arc::new(ElevenLabsSpeech::new(&config.elevenlabs)?);
    info!(voice_id = %voice.voice_id, "speech pipeline ready");
    Ok(SpeechPipeline::new(speech, voice, &config.speech))
}
