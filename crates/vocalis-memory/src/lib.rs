// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant-scoped semantic memory for Vocalis.
//!
//! User turns pass through the [`FragmentExtractor`]; memory-worthy spans are
//! embedded, checked for near-duplicates, and persisted by the
//! [`MemoryRecorder`]. The [`MemoryRetriever`] answers similarity queries for
//! a single (avatar, user) pair, caching results for a short TTL.

pub mod cache;
pub mod context;
pub mod extractor;
pub mod recorder;
pub mod recording;
pub mod retriever;
pub mod store;
pub mod types;

pub use cache::TtlCache;
pub use context::format_memory_context;
pub use extractor::FragmentExtractor;
pub use recorder::{MemoryRecorder, RecordOutcome};
pub use retriever::MemoryRetriever;
pub use store::SqliteFragmentStore;
pub use types::{FragmentCandidate, RetrievalQuery};
