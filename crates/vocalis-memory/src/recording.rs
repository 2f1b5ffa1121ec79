// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions for the memory subsystem.

use metrics::describe_counter;

/// Register memory metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "vocalis_retrieval_cache_total",
        "Memory retrievals by cache result (hit, miss)"
    );
    describe_counter!(
        "vocalis_fragments_stored_total",
        "Memory fragments persisted after the duplicate check"
    );
    describe_counter!(
        "vocalis_isolation_violations_total",
        "Store responses rejected for carrying another tenant's fragments"
    );
}
