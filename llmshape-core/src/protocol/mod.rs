//! Canonical response data model
//!
//! This module defines the unified structures that every provider payload is
//! normalized into. These structures are designed to be:
//! - Provider-agnostic
//! - Shape-compatible with OpenAI responses on the wire
//! - Extensible through passthrough `extra` maps
//! - Carrying observability data out of band in `HiddenParams`

pub mod types;

pub use types::{
    Choice, Delta, EmbeddingResponse, FunctionCall, FunctionCallDelta, HiddenParams,
    ImageResponse, Message, MessageContent, ModelResponse, RerankResponse, RerankResult,
    ResponseHeaders, StreamingChoice, StreamingResponse, ToolCall, ToolCallDelta,
    TranscriptionResponse, Usage,
};
