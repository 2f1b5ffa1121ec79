// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ElevenLabs-compatible speech provider for Vocalis.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};
use vocalis_config::model::ElevenLabsConfig;
use vocalis_core::types::{SpeechAudio, SpeechRequest};
use vocalis_core::{AdapterType, HealthStatus, PluginAdapter, SpeechAdapter, VocalisError};

pub use crate::client::ElevenLabsClient;

/// Speech provider implementing [`SpeechAdapter`].
///
/// API key resolution: `elevenlabs.api_key` (which
/// `VOCALIS_ELEVENLABS_API_KEY` overrides), then `ELEVENLABS_API_KEY`.
pub struct ElevenLabsSpeech {
    client: ElevenLabsClient,
}

impl ElevenLabsSpeech {
    pub fn new(config: &ElevenLabsConfig) -> Result<Self, VocalisError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = ElevenLabsClient::new(&api_key, config)?;
        info!(
            model = config.model_id,
            output_format = config.output_format,
            "speech provider initialized"
        );
        Ok(Self { client })
    }

    pub fn with_client(client: ElevenLabsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for ElevenLabsSpeech {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, VocalisError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechAdapter for ElevenLabsSpeech {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, VocalisError> {
        if request.voice.voice_id.is_empty() {
            return Err(VocalisError::Config("voice_id must not be empty".into()));
        }
        let audio = self.client.synthesize(&request.text, &request.voice).await?;
        debug!(
            voice_id = %request.voice.voice_id,
            model = self.client.model_id(),
            bytes = audio.bytes.len(),
            "synthesized sentence"
        );
        Ok(audio)
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, VocalisError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
        VocalisError::Config(
            "ElevenLabs API key not found. Set elevenlabs.api_key in config or ELEVENLABS_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::{VoiceConfig, VoiceSettings};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn speech_for(uri: &str) -> ElevenLabsSpeech {
        let config = ElevenLabsConfig {
            base_url: uri.to_string(),
            ..ElevenLabsConfig::default()
        };
        ElevenLabsSpeech::with_client(ElevenLabsClient::new("k", &config).unwrap())
    }

    #[test]
    fn resolve_api_key_prefers_config() {
        assert_eq!(resolve_api_key(&Some("xi-1".into())).unwrap(), "xi-1");
    }

    #[tokio::test]
    async fn adapter_routes_to_requested_voice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/bella"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"mp3".to_vec(), "audio/mpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let speech = speech_for(&server.uri());
        let audio = speech
            .synthesize(SpeechRequest {
                text: "One.".into(),
                voice: VoiceConfig {
                    voice_id: "bella".into(),
                    settings: VoiceSettings::default(),
                },
            })
            .await
            .unwrap();
        assert_eq!(&audio.bytes[..], b"mp3");
        assert_eq!(speech.adapter_type(), AdapterType::Speech);
    }

    #[tokio::test]
    async fn empty_voice_id_is_rejected_before_any_request() {
        let speech = speech_for("http://127.0.0.1:1");
        let err = speech
            .synthesize(SpeechRequest {
                text: "One.".into(),
                voice: VoiceConfig {
                    voice_id: String::new(),
                    settings: VoiceSettings::default(),
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VocalisError::Config(_)));
    }
}
