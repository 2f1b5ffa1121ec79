// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires segmenter, dispatcher, and sequencer under one cancellation token.

use std::sync::Arc;

use futures::Stream;
use tokio_util::sync::CancellationToken;
use vocalis_config::model::SpeechConfig;
use vocalis_core::{SpeechAdapter, VocalisError, VoiceConfig};

use crate::dispatcher::{DispatchLimits, SynthesisDispatcher};
use crate::segmenter::sentences;
use crate::sequencer::PlaybackSequencer;

/// Speaks a streaming model reply in order.
///
/// Cancelling the token stops reading deltas, abandons in-flight synthesis,
/// and ends playback.
#[derive(Clone)]
pub struct SpeechPipeline {
    dispatcher: SynthesisDispatcher,
    min_sentence_chars: usize,
}

impl SpeechPipeline {
    pub fn new(speech: Arc<dyn SpeechAdapter>, voice: VoiceConfig, config: &SpeechConfig) -> Self {
        Self {
            dispatcher: SynthesisDispatcher::new(speech, voice, DispatchLimits::from(config)),
            min_sentence_chars: config.min_sentence_chars,
        }
    }

    /// Starts speaking `deltas`. Must be called inside a Tokio runtime.
    pub fn start<S>(&self, deltas: S, cancel: CancellationToken) -> PlaybackSequencer
    where
        S: Stream<Item = Result<String, VocalisError>> + Send + Unpin + 'static,
    {
        let units = Box::pin(sentences(deltas, self.min_sentence_chars, cancel.clone()));
        let rx = self.dispatcher.dispatch(units, cancel.clone());
        PlaybackSequencer::new(rx, cancel)
    }
}
