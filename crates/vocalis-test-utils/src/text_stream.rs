// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned text-delta streams standing in for a streaming model reply.

use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use vocalis_core::VocalisError;

/// Yields each delta immediately, then ends.
pub fn deltas(parts: &[&str]) -> BoxStream<'static, Result<String, VocalisError>> {
    let owned: Vec<Result<String, VocalisError>> =
        parts.iter().map(|p| Ok(p.to_string())).collect();
    stream::iter(owned).boxed()
}

/// Yields each delta after `gap`, then ends.
pub fn paced_deltas(
    parts: &[&str],
    gap: Duration,
) -> BoxStream<'static, Result<String, VocalisError>> {
    let owned: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
    stream::iter(owned)
        .then(move |p| async move {
            tokio::time::sleep(gap).await;
            Ok(p)
        })
        .boxed()
}

/// Yields the deltas, then a provider error.
pub fn failing_after(parts: &[&str]) -> BoxStream<'static, Result<String, VocalisError>> {
    let mut items: Vec<Result<String, VocalisError>> =
        parts.iter().map(|p| Ok(p.to_string())).collect();
    items.push(Err(VocalisError::provider("stream interrupted")));
    stream::iter(items).boxed()
}
