// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered playback events for a single sink.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vocalis_core::VocalisError;

use crate::types::{PlaybackEvent, PlaybackSummary, SynthesisOutcome, SynthesisResult};

/// Downstream consumer of playback events (audio device, file writer, transport).
///
/// The sequencer awaits each `play` call before pulling the next event, so a
/// slow sink slows synthesis rather than growing a queue.
#[async_trait]
pub trait PlaybackSink: Send {
    async fn play(&mut self, event: &PlaybackEvent) -> Result<(), VocalisError>;
}

/// Converts ordered synthesis results into playback events.
///
/// Each sequence is emitted at most once. Failed slots become
/// [`PlaybackEvent::Skip`]. After cancellation nothing more is emitted and
/// anything still queued is drained and dropped.
pub struct PlaybackSequencer {
    rx: mpsc::Receiver<SynthesisResult>,
    cancel: CancellationToken,
    last_sequence: Option<u64>,
    finished: bool,
    cancelled: bool,
}

impl PlaybackSequencer {
    pub fn new(rx: mpsc::Receiver<SynthesisResult>, cancel: CancellationToken) -> Self {
        Self {
            rx,
            cancel,
            last_sequence: None,
            finished: false,
            cancelled: false,
        }
    }

    /// The next event, or `None` once the reply is finished or cancelled.
    pub async fn next(&mut self) -> Option<PlaybackEvent> {
        while !self.finished {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                received = self.rx.recv() => received,
            };

            let Some(result) = received else {
                self.finish();
                return None;
            };
            if self.cancel.is_cancelled() {
                self.finish();
                return None;
            }
            if self.last_sequence.is_some_and(|last| result.sequence <= last) {
                warn!(sequence = result.sequence, "suppressing duplicate or stale synthesis result");
                continue;
            }

            let SynthesisResult {
                sequence,
                text,
                outcome,
            } = result;
            match outcome {
                SynthesisOutcome::Audio(audio) => {
                    self.last_sequence = Some(sequence);
                    return Some(PlaybackEvent::Audio {
                        sequence,
                        text,
                        audio,
                    });
                }
                SynthesisOutcome::Failed(e) => {
                    self.last_sequence = Some(sequence);
                    return Some(PlaybackEvent::Skip {
                        sequence,
                        text,
                        reason: e.to_string(),
                    });
                }
                SynthesisOutcome::Cancelled => {
                    self.cancelled = true;
                    self.finish();
                    return None;
                }
            }
        }
        None
    }

    /// Whether playback ended because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled || self.cancel.is_cancelled()
    }

    /// Feeds every event to `sink`, one at a time.
    ///
    /// A sink error cancels the pipeline and is returned.
    pub async fn drain_to<K>(mut self, sink: &mut K) -> Result<PlaybackSummary, VocalisError>
    where
        K: PlaybackSink + ?Sized,
    {
        let mut summary = PlaybackSummary::default();
        while let Some(event) = self.next().await {
            if let Err(e) = sink.play(&event).await {
                self.cancel.cancel();
                self.finish();
                return Err(e);
            }
            match event {
                PlaybackEvent::Audio { .. } => summary.played += 1,
                PlaybackEvent::Skip { .. } => summary.skipped += 1,
            }
        }
        summary.cancelled = self.was_cancelled();
        debug!(
            played = summary.played,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "playback finished"
        );
        Ok(summary)
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.cancelled |= self.cancel.is_cancelled();
        self.rx.close();
        let mut dropped = 0usize;
        while let Ok(result) = self.rx.try_recv() {
            if matches!(result.outcome, SynthesisOutcome::Cancelled) {
                self.cancelled = true;
            }
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "suppressed results after playback ended");
        }
    }
}
