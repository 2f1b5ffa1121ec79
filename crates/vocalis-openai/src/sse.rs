// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for streaming chat completions.
//!
//! Turns the response byte stream into plain text deltas. The stream ends at
//! the `[DONE]` sentinel or when the connection closes, whichever comes first.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use vocalis_core::VocalisError;

use crate::types::{ApiErrorResponse, ChatChunk};

const DONE_SENTINEL: &str = "[DONE]";

/// Interpretation of one SSE `data:` payload.
#[derive(Debug)]
enum Frame {
    Delta(String),
    Skip,
    Done,
    Failed(VocalisError),
}

/// Parses a streaming chat completion response into text deltas.
pub fn parse_chat_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String, VocalisError>> + Send>> {
    let frames = response
        .bytes_stream()
        .eventsource()
        .map(|result| match result {
            Ok(event) => parse_data(&event.data),
            Err(e) => Frame::Failed(VocalisError::provider(format!("SSE stream error: {e}"))),
        });

    let deltas = frames
        .take_while(|frame| futures::future::ready(!matches!(frame, Frame::Done)))
        .filter_map(|frame| async move {
            match frame {
                Frame::Delta(text) => Some(Ok(text)),
                Frame::Failed(e) => Some(Err(e)),
                Frame::Skip | Frame::Done => None,
            }
        });

    Box::pin(deltas)
}

fn parse_data(data: &str) -> Frame {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Frame::Done;
    }
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
        return Frame::Failed(VocalisError::provider(format!(
            "chat stream error: {}",
            api_err.error.message
        )));
    }

    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map_or(Frame::Skip, Frame::Delta),
        Err(e) => Frame::Failed(VocalisError::Provider {
            message: format!("failed to parse chat chunk: {e}"),
            source: Some(Box::new(e)),
        }),
    }
}
