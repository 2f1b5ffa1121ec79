// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vocalis.
//!
//! Deterministic stand-ins for every external collaborator, so pipeline and
//! memory tests run without network access.
//!
//! # Components
//!
//! - [`MockEmbedder`] - bag-of-words embedder with a failure switch
//! - [`MockSpeech`] - speech provider with scripted latency and failures
//! - [`InMemoryFragmentStore`] / [`InMemoryTurnStore`] - scoped stores
//! - [`text_stream`] - canned model reply streams

pub mod memory_store;
pub mod mock_embedder;
pub mod mock_speech;
pub mod text_stream;

pub use memory_store::{InMemoryFragmentStore, InMemoryTurnStore};
pub use mock_embedder::MockEmbedder;
pub use mock_speech::MockSpeech;
