// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values flowing through the speech pipeline.

use vocalis_core::types::SpeechAudio;
use vocalis_core::VocalisError;

/// One complete sentence from the model's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceUnit {
    /// Position in the reply, starting at 0 with no gaps.
    pub sequence: u64,
    pub text: String,
    /// Set on the remainder flushed at end of stream.
    pub is_final: bool,
}

/// How a single synthesis call ended.
#[derive(Debug)]
pub enum SynthesisOutcome {
    Audio(SpeechAudio),
    /// Provider error or per-sentence timeout. Only this slot is affected.
    Failed(VocalisError),
    /// The pipeline was cancelled before this slot completed.
    Cancelled,
}

/// A synthesis outcome tagged with the sentence it belongs to.
#[derive(Debug)]
pub struct SynthesisResult {
    pub sequence: u64,
    pub text: String,
    pub outcome: SynthesisOutcome,
}

/// What the playback sink receives, in sequence order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Audio {
        sequence: u64,
        text: String,
        audio: SpeechAudio,
    },
    /// No audio for this sentence. The text is still delivered for captions.
    Skip {
        sequence: u64,
        text: String,
        reason: String,
    },
}

impl PlaybackEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            PlaybackEvent::Audio { sequence, .. } | PlaybackEvent::Skip { sequence, .. } => {
                *sequence
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            PlaybackEvent::Audio { text, .. } | PlaybackEvent::Skip { text, .. } => text,
        }
    }
}

/// Totals reported after a sequencer has been drained into a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub played: usize,
    pub skipped: usize,
    pub cancelled: bool,
}
