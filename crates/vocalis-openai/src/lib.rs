// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapters for Vocalis.
//!
//! [`OpenAiEmbedder`] implements [`EmbeddingAdapter`] for memory extraction
//! and retrieval. [`OpenAiChat`] streams avatar replies as text deltas, the
//! input the speech pipeline segments into sentences.

pub mod client;
pub mod sse;
pub mod types;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tracing::{debug, info};
use vocalis_config::VocalisConfig;
use vocalis_config::model::OpenAiConfig;
use vocalis_core::types::{EmbeddingInput, EmbeddingOutput};
use vocalis_core::{
    AdapterType, ConversationTurn, EmbeddingAdapter, HealthStatus, PluginAdapter, Speaker,
    VocalisError,
};

pub use crate::client::OpenAiClient;
pub use crate::types::ChatMessage;

/// Text delta stream produced by a chat completion.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, VocalisError>> + Send>>;

/// Embedding client backed by the `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
}

impl OpenAiEmbedder {
    /// API key resolution: `openai.api_key` (which `VOCALIS_OPENAI_API_KEY`
    /// overrides), then `OPENAI_API_KEY`, otherwise a configuration error.
    pub fn new(config: &OpenAiConfig) -> Result<Self, VocalisError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(&api_key, config)?;
        info!(model = config.embedding_model, "embedding client initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        // Probing would spend quota; construction already validated the key header.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, VocalisError> {
        let embeddings = self.client.embed(&input.texts).await?;
        let dimensions = embeddings.first().map_or(0, Vec::len);
        debug!(
            count = embeddings.len(),
            dimensions,
            model = self.client.embedding_model(),
            "embedded texts"
        );
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

/// Streaming chat completions for avatar replies.
pub struct OpenAiChat {
    client: OpenAiClient,
    system_prompt: String,
}

impl OpenAiChat {
    pub fn new(config: &VocalisConfig) -> Result<Self, VocalisError> {
        let api_key = resolve_api_key(&config.openai.api_key)?;
        let client = OpenAiClient::new(&api_key, &config.openai)?;
        let system_prompt = system_prompt(&config.agent.name, &config.agent.system_prompt);
        info!(model = config.openai.chat_model, "chat client initialized");
        Ok(Self {
            client,
            system_prompt,
        })
    }

    pub fn with_client(client: OpenAiClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// Assembles the request: persona prompt, optional memory block, prior
    /// turns oldest first, then the new user message.
    pub fn build_messages(
        &self,
        memory_context: Option<&str>,
        history: &[ConversationTurn],
        user_text: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);

        let system = match memory_context {
            Some(context) => format!("{}\n\n{context}", self.system_prompt),
            None => self.system_prompt.clone(),
        };
        messages.push(ChatMessage::system(system));

        for turn in history {
            messages.push(match turn.speaker {
                Speaker::User => ChatMessage::user(turn.text.clone()),
                Speaker::Avatar => ChatMessage::assistant(turn.text.clone()),
            });
        }

        messages.push(ChatMessage::user(user_text));
        messages
    }

    /// Starts streaming a reply to `messages`.
    pub async fn stream_reply(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ReplyStream, VocalisError> {
        debug!(
            messages = messages.len(),
            model = self.client.chat_model(),
            "starting chat stream"
        );
        self.client.stream_chat(messages).await
    }
}

#[async_trait]
impl PluginAdapter for OpenAiChat {
    fn name(&self) -> &str {
        "openai-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        Ok(HealthStatus::Healthy)
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, VocalisError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        VocalisError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}

fn system_prompt(avatar_name: &str, configured: &Option<String>) -> String {
    match configured {
        Some(prompt) if !prompt.trim().is_empty() => prompt.trim().to_string(),
        _ => format!(
            "You are {avatar_name}, a warm conversational companion. Reply in short spoken sentences."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::TenantScope;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str) -> OpenAiClient {
        let config = OpenAiConfig {
            base_url: uri.to_string(),
            ..OpenAiConfig::default()
        };
        OpenAiClient::new("k", &config).unwrap()
    }

    #[test]
    fn resolve_api_key_from_config() {
        assert_eq!(resolve_api_key(&Some("sk-test".into())).unwrap(), "sk-test");
    }

    #[test]
    fn resolve_api_key_none_falls_back_to_env() {
        let result = resolve_api_key(&None);
        // Succeeds only when OPENAI_API_KEY is set in the environment.
        if let Err(e) = result {
            assert!(e.to_string().contains("API key not found"), "got: {e}");
        }
    }

    #[test]
    fn system_prompt_defaults_to_avatar_name() {
        assert!(system_prompt("Nova", &None).starts_with("You are Nova"));
        assert!(system_prompt("Nova", &Some("   ".into())).starts_with("You are Nova"));
        assert_eq!(system_prompt("Nova", &Some(" Be kind. ".into())), "Be kind.");
    }

    #[test]
    fn build_messages_orders_history_and_appends_memory() {
        let chat = OpenAiChat::with_client(client_for("http://127.0.0.1:1"), "Persona.");
        let scope = TenantScope::new("a", "u");
        let history = vec![
            ConversationTurn::new(Speaker::User, "hello", scope.clone()),
            ConversationTurn::new(Speaker::Avatar, "hi!", scope),
        ];

        let messages = chat.build_messages(
            Some("## Relevant Memories\n- likes tea\n"),
            &history,
            "what do I like?",
        );

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.starts_with("Persona."));
        assert!(messages[0].content.contains("likes tea"));
        assert_eq!(messages[1], ChatMessage::user("hello"));
        assert_eq!(messages[2], ChatMessage::assistant("hi!"));
        assert_eq!(messages[3], ChatMessage::user("what do I like?"));
    }

    #[test]
    fn build_messages_without_memory_uses_bare_persona() {
        let chat = OpenAiChat::with_client(client_for("http://127.0.0.1:1"), "Persona.");
        let messages = chat.build_messages(None, &[], "hey");
        assert_eq!(messages[0].content, "Persona.");
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn embedder_reports_dimensions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 0, "embedding": [0.1, 0.2, 0.3]},
                    {"index": 1, "embedding": [0.4, 0.5, 0.6]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::with_client(client_for(&server.uri()));
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.dimensions, 3);
        assert_eq!(output.embeddings.len(), 2);
    }

    #[tokio::test]
    async fn embedder_failure_is_recoverable_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "bad key", "type": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::with_client(client_for(&server.uri()));
        let err = embedder.embed_one("a").await.unwrap_err();
        assert!(matches!(err, VocalisError::Provider { .. }));
        assert!(err.is_recoverable());
    }
}
