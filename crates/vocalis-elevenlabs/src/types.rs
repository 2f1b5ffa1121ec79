// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the text-to-speech endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vocalis_core::VoiceSettings;

/// Request body for `POST /v1/text-to-speech/{voice_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TtsRequest<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub voice_settings: &'a VoiceSettings,
}

/// Error envelope. The API reports failures under `detail`, either as an
/// object or as a bare string.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorDetail {
    Structured {
        #[serde(default)]
        status: Option<String>,
        message: String,
    },
    Plain(String),
}

impl ApiErrorDetail {
    pub fn describe(&self) -> String {
        match self {
            ApiErrorDetail::Structured {
                status: Some(status),
                message,
            } => format!("{status}: {message}"),
            ApiErrorDetail::Structured { status: None, message } => message.clone(),
            ApiErrorDetail::Plain(message) => message.clone(),
        }
    }
}

/// Parsed `output_format`, e.g. `mp3_44100_128` or `pcm_16000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3,
    /// 16-bit little-endian mono at the given sample rate.
    Pcm { sample_rate: u32 },
    Ulaw { sample_rate: u32 },
    Other,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Self {
        let mut parts = format.split('_');
        let codec = parts.next().unwrap_or_default();
        let rate = parts.next().and_then(|r| r.parse::<u32>().ok());
        match (codec, rate) {
            ("mp3", _) => OutputFormat::Mp3,
            ("pcm", Some(sample_rate)) if sample_rate > 0 => OutputFormat::Pcm { sample_rate },
            ("ulaw", Some(sample_rate)) if sample_rate > 0 => OutputFormat::Ulaw { sample_rate },
            _ => OutputFormat::Other,
        }
    }

    /// MIME type used when the response carries no `content-type`.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mpeg",
            OutputFormat::Pcm { .. } => "audio/pcm",
            OutputFormat::Ulaw { .. } => "audio/basic",
            OutputFormat::Other => "application/octet-stream",
        }
    }

    /// Playback length for raw formats, computed from the byte count.
    pub fn duration_of(self, len: usize) -> Option<Duration> {
        let (bytes_per_sample, rate) = match self {
            OutputFormat::Pcm { sample_rate } => (2u64, sample_rate),
            OutputFormat::Ulaw { sample_rate } => (1u64, sample_rate),
            _ => return None,
        };
        let samples = len as u64 / bytes_per_sample;
        Some(Duration::from_micros(samples * 1_000_000 / u64::from(rate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_settings_verbatim() {
        let settings = VoiceSettings {
            stability: 0.25,
            similarity_boost: 1.0,
            style: 0.5,
            use_speaker_boost: false,
        };
        let req = TtsRequest {
            text: "Hello.",
            model_id: "eleven_turbo_v2_5",
            voice_settings: &settings,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["voice_settings"]["stability"], 0.25);
        assert_eq!(json["voice_settings"]["similarity_boost"], 1.0);
        assert_eq!(json["voice_settings"]["style"], 0.5);
        assert_eq!(json["voice_settings"]["use_speaker_boost"], false);
    }

    #[test]
    fn error_detail_accepts_both_shapes() {
        let structured: ApiErrorResponse = serde_json::from_str(
            r#"{"detail":{"status":"quota_exceeded","message":"out of credits"}}"#,
        )
        .unwrap();
        assert_eq!(structured.detail.describe(), "quota_exceeded: out of credits");

        let plain: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":"voice not found"}"#).unwrap();
        assert_eq!(plain.detail.describe(), "voice not found");
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::parse("mp3_44100_128"), OutputFormat::Mp3);
        assert_eq!(
            OutputFormat::parse("pcm_16000"),
            OutputFormat::Pcm { sample_rate: 16000 }
        );
        assert_eq!(
            OutputFormat::parse("ulaw_8000"),
            OutputFormat::Ulaw { sample_rate: 8000 }
        );
        assert_eq!(OutputFormat::parse("opus"), OutputFormat::Other);
    }

    #[test]
    fn pcm_duration_from_length() {
        let format = OutputFormat::Pcm { sample_rate: 16000 };
        // One second of 16-bit mono.
        assert_eq!(format.duration_of(32_000), Some(Duration::from_secs(1)));
        assert_eq!(OutputFormat::Mp3.duration_of(32_000), None);
    }
}
