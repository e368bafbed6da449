//! Canonical response types
//!
//! Every provider payload is normalized into one of these structures. The
//! design prioritizes:
//! - OpenAI-compatible wire shapes for every response kind
//! - Forward compatibility through `extra` passthrough maps
//! - A non-wire `HiddenParams` side-channel for observability data

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Raw response headers as received from the provider
pub type ResponseHeaders = HashMap<String, String>;

/// Message content as sent by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Content parts (text, image, audio, ...), kept untyped
    Parts(Vec<Value>),
    /// Any other shape, passed through verbatim
    Other(Value),
}

impl MessageContent {
    /// Get text representation
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// Function call information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,

    /// Arguments to the function (JSON encoded)
    pub arguments: String,
}

/// Tool call information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Type of tool (currently always "function")
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function information
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a function tool call
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A complete assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender, "assistant" unless the provider said otherwise
    pub role: String,

    /// Text or content parts
    pub content: Option<MessageContent>,

    /// Legacy function call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Tool calls requested by the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Audio output payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Value>,
}

impl Message {
    /// Create an assistant message with text content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(MessageContent::Text(content.into())),
            function_call: None,
            tool_calls: None,
            audio: None,
        }
    }

    /// Content when it is plain text
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(MessageContent::as_text)
    }
}

/// One candidate completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Position in the provider's choice list
    pub index: usize,

    /// Canonical finish reason
    pub finish_reason: String,

    /// Generated message
    pub message: Message,

    /// Log probabilities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,

    /// Provider-specific enhancements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancements: Option<Value>,
}

/// Function call delta for streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FunctionCallDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Tool call delta for streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Index in the tool calls array
    pub index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub tool_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCallDelta>,
}

/// Partial message emitted during streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Delta {
    /// Role as sent by the provider, never defaulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallDelta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

impl Delta {
    /// Content when it is plain text
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(MessageContent::as_text)
    }
}

/// Streaming choice with delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingChoice {
    pub index: usize,

    pub delta: Delta,

    /// Raw provider finish reason, not mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancements: Option<Value>,
}

/// Token usage information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default, deserialize_with = "count_or_zero")]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default, deserialize_with = "count_or_zero")]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_tokens: u32,

    /// Provider-specific usage details (cache hits, reasoning tokens, ...)
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// Token counts may be sent as `null`; read those as zero
fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Usage {
    /// Create a usage record from the three canonical counts
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            extra: Map::new(),
        }
    }
}

/// Observability side-channel attached to every canonical response.
///
/// Never serialized with the response itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HiddenParams {
    /// Rate-limit headers plus provider-namespaced copies of every raw header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_headers: Option<HashMap<String, String>>,

    /// Provider round-trip latency in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_ms: Option<f64>,

    /// Arbitrary caller-supplied parameters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HiddenParams {
    /// Build hidden params from a caller-supplied map
    pub fn from_map(params: Map<String, Value>) -> Self {
        Self {
            additional_headers: None,
            response_ms: None,
            extra: params,
        }
    }

    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn merged_with(&self, other: HiddenParams) -> HiddenParams {
        let mut merged = self.clone();
        if other.additional_headers.is_some() {
            merged.additional_headers = other.additional_headers;
        }
        if other.response_ms.is_some() {
            merged.response_ms = other.response_ms;
        }
        merged.extra.extend(other.extra);
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.additional_headers.is_none() && self.response_ms.is_none() && self.extra.is_empty()
    }
}

/// Complete chat completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Unique response ID
    pub id: String,

    /// Object type ("chat.completion")
    pub object: String,

    /// Creation timestamp (unix seconds)
    pub created: i64,

    /// Model used for generation, possibly carrying a provider routing prefix
    pub model: Option<String>,

    /// Response choices
    pub choices: Vec<Choice>,

    /// Token usage information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// System fingerprint for reproducibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,

    /// Payload keys outside the canonical field set
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    pub hidden_params: HiddenParams,

    #[serde(skip)]
    pub response_headers: Option<ResponseHeaders>,
}

impl ModelResponse {
    /// Create an empty response with a generated id and the current timestamp
    pub fn new() -> Self {
        Self {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: None,
            choices: Vec::new(),
            usage: None,
            system_fingerprint: None,
            extra: Map::new(),
            hidden_params: HiddenParams::default(),
            response_headers: None,
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for ModelResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming chat completion chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingResponse {
    pub id: String,

    /// Object type ("chat.completion.chunk")
    pub object: String,

    pub created: i64,

    pub model: Option<String>,

    pub choices: Vec<StreamingChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl StreamingResponse {
    pub fn new() -> Self {
        Self {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            object: "chat.completion.chunk".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: None,
            choices: Vec::new(),
            usage: None,
            system_fingerprint: None,
        }
    }
}

impl Default for StreamingResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Embedding response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub model: Option<String>,

    /// Object type ("list")
    pub object: String,

    /// Embedding entries, kept as the provider sent them
    pub data: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(skip)]
    pub hidden_params: HiddenParams,

    #[serde(skip)]
    pub response_headers: Option<ResponseHeaders>,
}

impl Default for EmbeddingResponse {
    fn default() -> Self {
        Self {
            model: None,
            object: "list".to_string(),
            data: Vec::new(),
            usage: None,
            hidden_params: HiddenParams::default(),
            response_headers: None,
        }
    }
}

/// Image generation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub created: Option<i64>,

    /// Generated images (url or b64_json entries)
    pub data: Option<Vec<Value>>,

    #[serde(skip)]
    pub hidden_params: HiddenParams,
}

impl Default for ImageResponse {
    fn default() -> Self {
        Self {
            created: Some(chrono::Utc::now().timestamp()),
            data: None,
            hidden_params: HiddenParams::default(),
        }
    }
}

/// Audio transcription response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Audio duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Value>>,

    #[serde(skip)]
    pub hidden_params: HiddenParams,

    #[serde(skip)]
    pub response_headers: Option<ResponseHeaders>,
}

/// One scored document in a rerank response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    pub index: usize,

    pub relevance_score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
}

/// Rerank response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResponse {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RerankResult>>,

    /// Provider metadata (billed units, api version, ...)
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub meta: Map<String, Value>,

    #[serde(skip)]
    pub hidden_params: HiddenParams,
}

impl Default for RerankResponse {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            results: None,
            meta: Map::new(),
            hidden_params: HiddenParams::default(),
        }
    }
}
