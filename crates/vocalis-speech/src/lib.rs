// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming speech pipeline for Vocalis.
//!
//! ```text
//! text deltas -> SentenceSegmenter -> SynthesisDispatcher -> PlaybackSequencer -> sink
//!                 (sequence numbers)   (C parallel calls,     (skip on failure,
//!                                       reorder buffer)        stop on cancel)
//! ```
//!
//! Sequence numbers are the only ordering key. Provider latency never
//! reorders playback, and one failed sentence never blocks the next.

pub mod dispatcher;
pub mod pipeline;
pub mod recording;
pub mod segmenter;
pub mod sequencer;
pub mod types;

pub use dispatcher::{DispatchLimits, SynthesisDispatcher};
pub use pipeline::SpeechPipeline;
pub use segmenter::SentenceSegmenter;
pub use sequencer::{PlaybackSequencer, PlaybackSink};
pub use types::{PlaybackEvent, PlaybackSummary, SentenceUnit, SynthesisOutcome, SynthesisResult};
