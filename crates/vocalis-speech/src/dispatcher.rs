// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency synthesis with in-order delivery.
//!
//! A single driver task owns all mutable state: the worker set, the
//! reordering buffer, and the delivery cursor. Workers race each other, but
//! results only leave the driver in the order their sentences arrived.
//!
//! New sentences are pulled from upstream only while fewer than
//! `max_concurrency` calls are in flight and fewer than `reorder_capacity`
//! results are issued but undelivered. A slow consumer therefore throttles
//! synthesis instead of growing the buffer.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vocalis_config::model::SpeechConfig;
use vocalis_core::types::SpeechRequest;
use vocalis_core::{SpeechAdapter, VocalisError, VoiceConfig};

use crate::recording::record_synthesis;
use crate::types::{SentenceUnit, SynthesisOutcome, SynthesisResult};

/// Results channel depth. Kept at one so consumer speed is felt immediately.
const OUTPUT_CAPACITY: usize = 1;

/// Tuning for [`SynthesisDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_concurrency: usize,
    pub sentence_timeout: Duration,
    pub reorder_capacity: usize,
}

impl From<&SpeechConfig> for DispatchLimits {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            sentence_timeout: config.sentence_timeout(),
            reorder_capacity: config.reorder_capacity,
        }
    }
}

impl DispatchLimits {
    /// Clamp to a usable shape: at least one worker, buffer no smaller than the pool.
    fn normalized(self) -> Self {
        let max_concurrency = self.max_concurrency.max(1);
        Self {
            max_concurrency,
            sentence_timeout: self.sentence_timeout,
            reorder_capacity: self.reorder_capacity.max(max_concurrency),
        }
    }
}

/// Turns ordered sentences into ordered synthesis results.
#[derive(Clone)]
pub struct SynthesisDispatcher {
    speech: Arc<dyn SpeechAdapter>,
    voice: VoiceConfig,
    limits: DispatchLimits,
}

impl SynthesisDispatcher {
    pub fn new(speech: Arc<dyn SpeechAdapter>, voice: VoiceConfig, limits: DispatchLimits) -> Self {
        Self {
            speech,
            voice,
            limits: limits.normalized(),
        }
    }

    /// Starts dispatching `sentences` on a background task.
    ///
    /// The returned receiver yields exactly one result per consumed sentence,
    /// in consumption order, and closes when upstream is exhausted. On
    /// cancellation, already-completed results are discarded, in-flight
    /// sentences are each reported as [`SynthesisOutcome::Cancelled`] until
    /// the consumer closes its end, and the channel closes.
    pub fn dispatch<S>(
        &self,
        sentences: S,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<SynthesisResult>
    where
        S: Stream<Item = SentenceUnit> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(OUTPUT_CAPACITY);
        let driver = Driver {
            speech: self.speech.clone(),
            voice: self.voice.clone(),
            limits: self.limits,
            cancel,
            tx,
            workers: JoinSet::new(),
            slots: HashMap::new(),
            order: VecDeque::new(),
            reorder: BTreeMap::new(),
        };
        tokio::spawn(driver.run(sentences));
        rx
    }
}

struct Driver {
    speech: Arc<dyn SpeechAdapter>,
    voice: VoiceConfig,
    limits: DispatchLimits,
    cancel: CancellationToken,
    tx: mpsc::Sender<SynthesisResult>,
    workers: JoinSet<SynthesisResult>,
    /// In-flight task id to (sequence, text), for panics and cancellation.
    slots: HashMap<Id, (u64, String)>,
    /// Issued but undelivered sequences, in arrival order. The front is the delivery cursor.
    order: VecDeque<u64>,
    /// Completed results waiting for the cursor.
    reorder: BTreeMap<u64, SynthesisResult>,
}

enum Flow {
    Continue,
    Stop,
}

impl Driver {
    async fn run<S>(mut self, mut sentences: S)
    where
        S: Stream<Item = SentenceUnit> + Send + Unpin + 'static,
    {
        let mut upstream_done = false;
        loop {
            if let Flow::Stop = self.deliver_ready().await {
                return;
            }
            if upstream_done && self.order.is_empty() {
                debug!("synthesis dispatch complete");
                return;
            }

            let can_issue = !upstream_done
                && self.workers.len() < self.limits.max_concurrency
                && self.order.len() < self.limits.reorder_capacity;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.abandon().await;
                    return;
                }
                Some(joined) = self.workers.join_next_with_id(), if !self.workers.is_empty() => {
                    self.complete(joined);
                }
                next = sentences.next(), if can_issue => match next {
                    Some(unit) => self.issue(unit),
                    None => upstream_done = true,
                },
            }
        }
    }

    /// Hands every result at the cursor to the consumer.
    async fn deliver_ready(&mut self) -> Flow {
        while let Some(&sequence) = self.order.front() {
            let Some(result) = self.reorder.remove(&sequence) else {
                break;
            };
            self.order.pop_front();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.abandon().await;
                    return Flow::Stop;
                }
                sent = self.tx.send(result) => {
                    if sent.is_err() {
                        debug!("playback receiver dropped, stopping dispatch");
                        self.workers.abort_all();
                        return Flow::Stop;
                    }
                }
            }
        }
        Flow::Continue
    }

    fn issue(&mut self, unit: SentenceUnit) {
        let SentenceUnit { sequence, text, .. } = unit;
        let speech = self.speech.clone();
        let voice = self.voice.clone();
        let timeout = self.limits.sentence_timeout;
        let cancel = self.cancel.clone();
        let request_text = text.clone();

        let handle = self.workers.spawn(async move {
            let started = Instant::now();
            let call = tokio::time::timeout(
                timeout,
                speech.synthesize(SpeechRequest {
                    text: request_text.clone(),
                    voice,
                }),
            );
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => SynthesisOutcome::Cancelled,
                result = call => match result {
                    Ok(Ok(audio)) => SynthesisOutcome::Audio(audio),
                    Ok(Err(e)) => SynthesisOutcome::Failed(e),
                    Err(_) => SynthesisOutcome::Failed(VocalisError::Timeout { duration: timeout }),
                },
            };
            let elapsed = started.elapsed();
            let label = match &outcome {
                SynthesisOutcome::Audio(_) => "ok",
                SynthesisOutcome::Failed(VocalisError::Timeout { .. }) => "timeout",
                SynthesisOutcome::Failed(_) => "error",
                SynthesisOutcome::Cancelled => "cancelled",
            };
            record_synthesis(label, elapsed.as_secs_f64());
            debug!(sequence, outcome = label, elapsed_ms = elapsed.as_millis() as u64, "sentence synthesized");
            SynthesisResult {
                sequence,
                text: request_text,
                outcome,
            }
        });

        debug!(sequence, in_flight = self.workers.len(), "sentence issued");
        self.slots.insert(handle.id(), (sequence, text));
        self.order.push_back(sequence);
    }

    fn complete(&mut self, joined: Result<(Id, SynthesisResult), tokio::task::JoinError>) {
        match joined {
            Ok((id, result)) => {
                self.slots.remove(&id);
                if let SynthesisOutcome::Failed(e) = &result.outcome {
                    warn!(sequence = result.sequence, error = %e, "sentence synthesis failed, skipping audio");
                }
                self.reorder.insert(result.sequence, result);
            }
            Err(join_err) => {
                if let Some((sequence, text)) = self.slots.remove(&join_err.id()) {
                    warn!(sequence, error = %join_err, "synthesis task aborted");
                    self.reorder.insert(
                        sequence,
                        SynthesisResult {
                            sequence,
                            text,
                            outcome: SynthesisOutcome::Failed(VocalisError::Internal(format!(
                                "synthesis task failed: {join_err}"
                            ))),
                        },
                    );
                }
            }
        }
    }

    /// Cancellation: stop workers, drop buffered audio, report in-flight slots.
    ///
    /// Every in-flight slot is reported as [`SynthesisOutcome::Cancelled`],
    /// unless the consumer closes the channel first.
    async fn abandon(&mut self) {
        self.workers.abort_all();
        let discarded = self.reorder.len();
        self.reorder.clear();
        self.order.clear();

        let mut in_flight: Vec<(u64, String)> = self.slots.drain().map(|(_, slot)| slot).collect();
        in_flight.sort_by_key(|(sequence, _)| *sequence);
        let mut reported = 0usize;
        for (sequence, text) in in_flight {
            record_synthesis("cancelled", 0.0);
            let result = SynthesisResult {
                sequence,
                text,
                outcome: SynthesisOutcome::Cancelled,
            };
            let sent = tokio::select! {
                biased;
                _ = self.tx.closed() => false,
                sent = self.tx.send(result) => sent.is_ok(),
            };
            if !sent {
                break;
            }
            reported += 1;
        }
        debug!(discarded, reported, "synthesis dispatch cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use vocalis_test_utils::MockSpeech;

    fn units(texts: &[&str]) -> Vec<SentenceUnit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| SentenceUnit {
                sequence: i as u64,
                text: t.to_string(),
                is_final: i + 1 == texts.len(),
            })
            .collect()
    }

    fn limits(max_concurrency: usize, reorder_capacity: usize) -> DispatchLimits {
        DispatchLimits {
            max_concurrency,
            sentence_timeout: Duration::from_secs(5),
            reorder_capacity,
        }
    }

    fn dispatcher(speech: Arc<MockSpeech>, limits: DispatchLimits) -> SynthesisDispatcher {
        let voice = VoiceConfig {
            voice_id: "voice-1".into(),
            settings: Default::default(),
        };
        SynthesisDispatcher::new(speech, voice, limits)
    }

    async fn collect(mut rx: mpsc::Receiver<SynthesisResult>) -> Vec<SynthesisResult> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn later_sentence_finishing_first_is_still_delivered_second() {
        let speech = Arc::new(
            MockSpeech::new()
                .delay_for("S0", Duration::from_millis(300))
                .delay_for("S1", Duration::from_millis(50)),
        );
        let rx = dispatcher(speech.clone(), limits(2, 4))
            .dispatch(stream::iter(units(&["S0", "S1", "S2"])), CancellationToken::new());

        let results = collect(rx).await;
        let order: Vec<u64> = results.iter().map(|r| r.sequence).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(speech.completed()[0], "S1", "S1 must really finish first");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_cap() {
        let speech = Arc::new(MockSpeech::with_default_delay(Duration::from_millis(100)));
        let texts: Vec<String> = (0..8).map(|i| format!("sentence {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let rx = dispatcher(speech.clone(), limits(3, 6))
            .dispatch(stream::iter(units(&refs)), CancellationToken::new());

        assert_eq!(collect(rx).await.len(), 8);
        assert_eq!(speech.max_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_failed_slot() {
        let speech = Arc::new(MockSpeech::new().delay_for("stuck", Duration::from_secs(60)));
        let rx = dispatcher(speech, limits(2, 4))
            .dispatch(stream::iter(units(&["stuck", "fine"])), CancellationToken::new());

        let results = collect(rx).await;
        assert!(matches!(
            results[0].outcome,
            SynthesisOutcome::Failed(VocalisError::Timeout { .. })
        ));
        assert!(matches!(results[1].outcome, SynthesisOutcome::Audio(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_throttles_issuing() {
        let speech = Arc::new(MockSpeech::with_default_delay(Duration::from_millis(10)));
        let texts: Vec<String> = (0..20).map(|i| format!("sentence {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut rx = dispatcher(speech.clone(), limits(2, 3))
            .dispatch(stream::iter(units(&refs)), CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(5)).await;
        // Outstanding slots, plus one result in the channel and one mid-send.
        assert!(speech.requested().len() <= 3 + 2);

        let mut seen = 0;
        while rx.recv().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_reports_every_in_flight_slot_and_closes() {
        let speech = Arc::new(MockSpeech::with_default_delay(Duration::from_secs(10)));
        let cancel = CancellationToken::new();
        let rx = dispatcher(speech.clone(), limits(3, 3))
            .dispatch(stream::iter(units(&["one", "two", "three", "four"])), cancel.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let results = collect(rx).await;
        let sequences: Vec<u64> = results.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(results
            .iter()
            .all(|r| matches!(r.outcome, SynthesisOutcome::Cancelled)));
        assert_eq!(speech.requested().len(), 3, "fourth sentence never issued");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(speech.in_flight(), 0, "in-flight calls are abandoned");
    }
}
