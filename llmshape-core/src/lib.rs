//! llmshape core library
//!
//! Normalizes the responses of heterogeneous LLM providers into one canonical
//! schema: chat completions (plain or replayed as a stream), embeddings, image
//! generations, audio transcriptions and rerank results.
//!
//! ```
//! use llmshape_core::{assemble, AssembleOptions, ResponseKind};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "id": "chatcmpl-1",
//!     "model": "gpt-4",
//!     "choices": [{
//!         "message": {"role": "assistant", "content": "hi"},
//!         "finish_reason": "end_turn"
//!     }]
//! });
//!
//! let response = assemble(
//!     payload.as_object(),
//!     ResponseKind::Completion(None),
//!     AssembleOptions::new(),
//! )
//! .unwrap()
//! .into_completion()
//! .unwrap();
//!
//! assert_eq!(response.choices[0].finish_reason, "stop");
//! ```

pub mod config;
pub mod metadata;
pub mod normalize;
pub mod protocol;

pub use config::NormalizerConfig;
pub use normalize::{
    assemble, map_finish_reason, AssembleOptions, CanonicalResponse, NormalizeError,
    NormalizeResult, ResponseKind, ResponseNormalizer,
};

/// Returns the version of the llmshape core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
