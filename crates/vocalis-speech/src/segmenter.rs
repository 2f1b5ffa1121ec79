// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental sentence segmentation of a streaming model reply.
//!
//! The segmenter is a small state machine: an accumulating buffer, a boundary
//! scan, and a minimum-length gate. A boundary is `.`, `!` or `?` followed by
//! whitespace. A span is emitted only when it holds strictly more than
//! `min_chars` non-whitespace characters; shorter spans ("3.", "Dr.") are
//! extended to the next boundary instead.

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vocalis_core::VocalisError;

use crate::types::SentenceUnit;

pub struct SentenceSegmenter {
    buffer: String,
    /// Byte offset in `buffer` where the boundary scan resumes.
    scan_from: usize,
    next_sequence: u64,
    min_chars: usize,
}

impl SentenceSegmenter {
    pub fn new(min_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            scan_from: 0,
            next_sequence: 0,
            min_chars,
        }
    }

    /// Appends a delta and returns every sentence it completed.
    pub fn push(&mut self, delta: &str) -> Vec<SentenceUnit> {
        self.buffer.push_str(delta);
        let mut units = Vec::new();
        while let Some(end) = self.next_boundary() {
            let span = &self.buffer[..end];
            if non_whitespace_len(span) > self.min_chars {
                let text = span.trim().to_string();
                self.buffer.drain(..end);
                self.scan_from = 0;
                units.push(self.unit(text, false));
            } else {
                self.scan_from = end;
            }
        }
        units
    }

    /// Flushes the remainder as the final unit. Further calls return `None`.
    pub fn finish(&mut self) -> Option<SentenceUnit> {
        let rest = std::mem::take(&mut self.buffer);
        self.scan_from = 0;
        let text = rest.trim();
        (!text.is_empty()).then(|| self.unit(text.to_string(), true))
    }

    fn unit(&mut self, text: String, is_final: bool) -> SentenceUnit {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        debug!(sequence, is_final, chars = text.len(), "sentence segmented");
        SentenceUnit {
            sequence,
            text,
            is_final,
        }
    }

    /// End offset (just past the punctuation) of the next boundary after `scan_from`.
    fn next_boundary(&self) -> Option<usize> {
        let mut chars = self.buffer[self.scan_from..].char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if matches!(ch, '.' | '!' | '?')
                && chars.peek().is_some_and(|(_, next)| next.is_whitespace())
            {
                return Some(self.scan_from + idx + ch.len_utf8());
            }
        }
        None
    }
}

fn non_whitespace_len(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

struct SentenceState<S> {
    deltas: S,
    segmenter: SentenceSegmenter,
    pending: VecDeque<SentenceUnit>,
    cancel: CancellationToken,
    done: bool,
}

/// Lazily segments a delta stream into sentences.
///
/// An upstream error ends the stream like a normal end: the buffered
/// remainder becomes the final unit. Cancellation stops consumption
/// immediately and discards the buffer.
pub fn sentences<S>(
    deltas: S,
    min_chars: usize,
    cancel: CancellationToken,
) -> impl Stream<Item = SentenceUnit> + Send + 'static
where
    S: Stream<Item = Result<String, VocalisError>> + Send + Unpin + 'static,
{
    let state = SentenceState {
        deltas,
        segmenter: SentenceSegmenter::new(min_chars),
        pending: VecDeque::new(),
        cancel,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.cancel.is_cancelled() {
                return None;
            }
            if let Some(unit) = state.pending.pop_front() {
                return Some((unit, state));
            }
            if state.done {
                return None;
            }

            let next = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => return None,
                next = state.deltas.next() => next,
            };
            match next {
                Some(Ok(delta)) => {
                    let units = state.segmenter.push(&delta);
                    state.pending.extend(units);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "text stream failed, flushing buffered text");
                    state.pending.extend(state.segmenter.finish());
                    state.done = true;
                }
                None => {
                    state.pending.extend(state.segmenter.finish());
                    state.done = true;
                }
            }
        }
    })
}
