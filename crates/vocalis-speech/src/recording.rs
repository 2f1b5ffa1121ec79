// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers for the speech pipeline.
//!
//! Uses the metrics-rs facade; nothing is recorded unless a recorder is installed.

use metrics::{describe_counter, describe_histogram};

/// Register speech pipeline metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "vocalis_synthesis_total",
        "Sentence synthesis calls by outcome"
    );
    describe_histogram!(
        "vocalis_synthesis_latency_seconds",
        "Speech provider latency per sentence in seconds"
    );
}

/// Record one finished synthesis call.
pub fn record_synthesis(outcome: &'static str, seconds: f64) {
    metrics::counter!("vocalis_synthesis_total", "outcome" => outcome).increment(1);
    if outcome == "ok" {
        metrics::histogram!("vocalis_synthesis_latency_seconds").record(seconds);
    }
}
