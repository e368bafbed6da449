//! Replaying a complete payload as a streaming response
//!
//! Used when a non-streaming payload (usually a cache hit) has to be handed to
//! a caller that asked for a stream. Both adapters produce exactly one
//! `StreamingResponse` holding every choice as a delta.
//!
//! Unlike the non-streaming path, deltas keep the provider's `role` as-is and
//! the finish reason is neither mapped nor defaulted.

use super::error::{NormalizeError, NormalizeResult};
use super::raw::{decode_payload, decode_value, unix_seconds, RawChoice, RawCompletion, RawPayload};
use crate::protocol::{Delta, StreamingChoice, StreamingResponse};
use async_stream::stream;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Blocking replay: an iterator over the single chunk
pub type ReplayStream = std::iter::Once<StreamingResponse>;

/// Async replay: yields the single chunk, then suspends once before ending
pub type ReplayChunkStream = Pin<Box<dyn Stream<Item = StreamingResponse> + Send>>;

/// Replay `payload` as a one-chunk blocking stream
pub fn to_streaming_response(payload: Option<&RawPayload>) -> NormalizeResult<ReplayStream> {
    let response = build_streaming_response(payload, true)?;
    Ok(std::iter::once(response))
}

/// Replay `payload` as a one-chunk async stream.
///
/// After the chunk is yielded the stream performs one `yield_now` so a
/// cooperative scheduler can interleave other work. Enhancements are not
/// carried on this path.
pub fn to_streaming_response_async(
    payload: Option<&RawPayload>,
) -> NormalizeResult<ReplayChunkStream> {
    let response = build_streaming_response(payload, false)?;
    Ok(Box::pin(stream! {
        yield response;
        tokio::task::yield_now().await;
    }))
}

fn build_streaming_response(
    payload: Option<&RawPayload>,
    carry_enhancements: bool,
) -> NormalizeResult<StreamingResponse> {
    let payload = payload
        .ok_or_else(|| NormalizeError::MalformedInput("response object is missing".to_string()))?;
    let raw: RawCompletion = decode_payload(payload, "streaming payload")?;

    let mut response = StreamingResponse::new();
    response.choices = raw
        .choice_values()?
        .iter()
        .enumerate()
        .map(|(index, value)| streaming_choice(index, value, carry_enhancements))
        .collect::<NormalizeResult<Vec<_>>>()?;
    response.usage = raw.zero_filled_usage();

    if let Some(Some(id)) = raw.id {
        response.id = id;
    }
    if let Some(created) = raw.created.flatten().as_ref().and_then(unix_seconds) {
        response.created = created;
    }
    if let Some(fingerprint) = raw.system_fingerprint {
        response.system_fingerprint = fingerprint;
    }
    if let Some(model) = raw.model {
        response.model = model;
    }

    tracing::debug!(choices = response.choices.len(), "replayed payload as stream chunk");
    Ok(response)
}

fn streaming_choice(
    index: usize,
    value: &Value,
    carry_enhancements: bool,
) -> NormalizeResult<StreamingChoice> {
    let choice: RawChoice = decode_value(value, "choice")?;
    let finish_reason = choice.finish_reason_or_details();
    let tool_calls = choice.message.delta_tool_calls()?;

    let message = choice.message;
    let delta = Delta {
        role: message.role,
        content: message.content,
        function_call: message.function_call.map(|f| f.into_delta()),
        tool_calls,
    };

    Ok(StreamingChoice {
        index,
        delta,
        finish_reason,
        logprobs: choice.logprobs,
        enhancements: if carry_enhancements {
            choice.enhancements
        } else {
            None
        },
    })
}
