//! Response normalization
//!
//! Turns provider payloads (already decoded into JSON maps) into the canonical
//! responses of [`crate::protocol`]. Everything that reads raw payload keys
//! lives in [`raw`]; the rest of the module works on typed values.

mod assembler;
mod embedding;
mod error;
mod merge;
mod rerank;
mod timing;

pub mod finish_reason;
pub mod headers;
pub mod raw;
pub mod streaming;
pub mod tool_calls;

pub use assembler::{
    assemble, AssembleOptions, CanonicalResponse, ResponseKind, ResponseNormalizer,
};
pub use embedding::assemble_embedding;
pub use error::{DiagnosticContext, NormalizeError, NormalizeResult};
pub use finish_reason::map_finish_reason;
pub use headers::{merge_response_headers, DEFAULT_PROVIDER_HEADER_PREFIX};
pub use merge::{merge_completion, merge_model_name, CompletionUpdate};
pub use raw::RawPayload;
pub use rerank::assemble_rerank;
pub use streaming::{
    to_streaming_response, to_streaming_response_async, ReplayChunkStream, ReplayStream,
};
pub use timing::{elapsed_ms, Timestamp};
pub use tool_calls::{repair_parallel_tool_calls, PARALLEL_TOOL_CALL_NAME};
