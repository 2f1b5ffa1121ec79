// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the ElevenLabs text-to-speech API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use tracing::{debug, warn};
use vocalis_config::model::ElevenLabsConfig;
use vocalis_core::types::SpeechAudio;
use vocalis_core::{VocalisError, VoiceConfig};

use crate::types::{ApiErrorResponse, OutputFormat, TtsRequest};

/// HTTP client for speech synthesis.
///
/// Authenticates with the `xi-api-key` header and retries once on
/// transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: reqwest::Client,
    base_url: Url,
    model_id: String,
    output_format: String,
    max_retries: u32,
}

impl ElevenLabsClient {
    pub fn new(api_key: &str, config: &ElevenLabsConfig) -> Result<Self, VocalisError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "xi-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                VocalisError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("audio/*"));

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            VocalisError::Config(format!(
                "invalid elevenlabs.base_url '{}': {e}",
                config.base_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VocalisError::Config(format!(
                "elevenlabs.base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        // Sentences are short; a stuck call is bounded by the dispatcher's own timeout.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VocalisError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
            max_retries: 1,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// `{base}/v1/text-to-speech/{voice_id}?output_format=...`
    fn synthesis_url(&self, voice_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "text-to-speech", voice_id]);
        }
        url.query_pairs_mut()
            .append_pair("output_format", &self.output_format);
        url
    }

    /// Synthesizes `text` with `voice`. Voice settings are sent unmodified.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
    ) -> Result<SpeechAudio, VocalisError> {
        let url = self.synthesis_url(&voice.voice_id);
        let body = TtsRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &voice.settings,
        };
        let format = OutputFormat::parse(&self.output_format);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, voice_id = %voice.voice_id, "retrying synthesis after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(url.clone())
                .json(&body)
                .send()
                .await
                .map_err(|e| VocalisError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, chars = text.len(), "synthesis response received");

            if status.is_success() {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .unwrap_or_else(|| format.content_type().to_string());
                let bytes = response.bytes().await.map_err(|e| VocalisError::Provider {
                    message: format!("failed to read audio body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                if bytes.is_empty() {
                    return Err(VocalisError::provider("speech provider returned empty audio"));
                }
                let duration_hint = format.duration_of(bytes.len());
                return Ok(SpeechAudio {
                    bytes,
                    content_type,
                    duration_hint,
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(VocalisError::provider(format!(
                    "API returned {status}: {body}"
                )));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("ElevenLabs API error ({status}): {}", api_err.detail.describe()),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(VocalisError::provider(message));
        }

        Err(last_error
            .unwrap_or_else(|| VocalisError::provider("synthesis failed after retries")))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::VoiceSettings;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, output_format: &str) -> ElevenLabsClient {
        let config = ElevenLabsConfig {
            base_url: base_url.to_string(),
            output_format: output_format.to_string(),
            ..ElevenLabsConfig::default()
        };
        ElevenLabsClient::new("xi-test-key", &config).unwrap()
    }

    fn voice() -> VoiceConfig {
        VoiceConfig {
            voice_id: "rachel".into(),
            settings: VoiceSettings {
                stability: 0.25,
                similarity_boost: 0.5,
                style: 0.75,
                use_speaker_boost: false,
            },
        }
    }

    #[test]
    fn synthesis_url_appends_voice_and_format() {
        let client = test_client("https://tts.example.com/", "mp3_44100_128");
        assert_eq!(
            client.synthesis_url("voice 1").as_str(),
            "https://tts.example.com/v1/text-to-speech/voice%201?output_format=mp3_44100_128"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let config = ElevenLabsConfig {
            base_url: "not a url".into(),
            ..ElevenLabsConfig::default()
        };
        let err = ElevenLabsClient::new("k", &config).unwrap_err();
        assert!(matches!(err, VocalisError::Config(_)));
    }

    #[tokio::test]
    async fn synthesize_sends_settings_unmodified() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/rachel"))
            .and(query_param("output_format", "mp3_44100_128"))
            .and(header("xi-api-key", "xi-test-key"))
            .and(body_json(serde_json::json!({
                "text": "Hello there.",
                "model_id": "eleven_turbo_v2_5",
                "voice_settings": {
                    "stability": 0.25,
                    "similarity_boost": 0.5,
                    "style": 0.75,
                    "use_speaker_boost": false
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"ID3audio".to_vec(), "audio/mpeg"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "mp3_44100_128");
        let audio = client.synthesize("Hello there.", &voice()).await.unwrap();
        assert_eq!(&audio.bytes[..], b"ID3audio");
        assert_eq!(audio.content_type, "audio/mpeg");
        assert!(audio.duration_hint.is_none());
    }

    #[tokio::test]
    async fn pcm_output_reports_duration() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/rachel"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16_000], "audio/pcm"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "pcm_16000");
        let audio = client.synthesize("Hi.", &voice()).await.unwrap();
        assert_eq!(audio.duration_hint, Some(Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "detail": {"status": "too_many_concurrent_requests", "message": "slow down"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"ok".to_vec(), "audio/mpeg"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "mp3_44100_128");
        let audio = client.synthesize("Hi.", &voice()).await.unwrap();
        assert_eq!(&audio.bytes[..], b"ok");
    }

    #[tokio::test]
    async fn exhausts_retries_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "mp3_44100_128");
        let err = client.synthesize("Hi.", &voice()).await.unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn fails_fast_on_401_with_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": {"status": "invalid_api_key", "message": "Invalid API key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "mp3_44100_128");
        let err = client.synthesize("Hi.", &voice()).await.unwrap_err();
        assert!(err.to_string().contains("invalid_api_key"), "got: {err}");
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn empty_audio_is_a_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(Vec::<u8>::new(), "audio/mpeg"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), "mp3_44100_128");
        let err = client.synthesize("Hi.", &voice()).await.unwrap_err();
        assert!(err.to_string().contains("empty audio"));
    }
}
