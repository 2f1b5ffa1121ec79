// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech provider trait for text-to-speech synthesis.

use async_trait::async_trait;

use crate::error::VocalisError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SpeechAudio, SpeechRequest};

/// Adapter for a text-to-speech provider.
///
/// Voice settings in the request are forwarded to the provider as-is.
#[async_trait]
pub trait SpeechAdapter: PluginAdapter {
    /// Synthesizes audio for one piece of text.
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio, VocalisError>;
}
