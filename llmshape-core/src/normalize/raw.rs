//! Decoding boundary for provider payloads
//!
//! Payloads arrive as untyped JSON objects. Everything downstream works on the
//! intermediates defined here, so every "is this key present" decision lives in
//! this file. Fields typed `Option<Option<T>>` distinguish an absent key
//! (`None`) from an explicit `null` (`Some(None)`).

use super::error::{NormalizeError, NormalizeResult};
use crate::protocol::{
    FunctionCall, FunctionCallDelta, MessageContent, RerankResult, ToolCall, ToolCallDelta,
    Usage,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Untyped, provider-shaped payload
pub type RawPayload = Map<String, Value>;

/// Keep "present but null" apart from "absent"
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Decode a whole payload into one of the intermediates below
pub fn decode_payload<T: DeserializeOwned>(
    payload: &RawPayload,
    what: &'static str,
) -> NormalizeResult<T> {
    serde_json::from_value(Value::Object(payload.clone()))
        .map_err(|e| NormalizeError::decode(what, e))
}

/// Decode a single nested value
pub fn decode_value<T: DeserializeOwned>(value: &Value, what: &'static str) -> NormalizeResult<T> {
    T::deserialize(value).map_err(|e| NormalizeError::decode(what, e))
}

/// First candidate that is present and non-empty.
///
/// Candidates are tried in order; this is the one place where "falsy" string
/// fallbacks are decided.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
}

/// Unix seconds from an integer or float JSON number
pub fn unix_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}

/// JSON-encoded text of an argument value; strings are taken verbatim
fn argument_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// `error` object carried by a failed payload
#[derive(Debug, Default, PartialEq)]
pub struct RawError {
    /// Numeric `code`, when the provider sent one
    pub status_code: Option<u16>,

    /// `message`, JSON-encoded when structured
    pub message: Option<String>,
}

impl RawError {
    /// Read `payload["error"]`; `None` when absent or null
    pub fn from_payload(payload: &RawPayload) -> Option<Self> {
        let error = payload.get("error").filter(|e| !e.is_null())?;
        let Value::Object(fields) = error else {
            return Some(RawError::default());
        };

        let status_code = fields.get("code").and_then(|code| match code {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        });
        let message = fields
            .get("message")
            .filter(|m| !m.is_null())
            .map(|message| match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            });

        Some(RawError {
            status_code,
            message,
        })
    }
}

/// Top-level fields of a chat completion payload
#[derive(Debug, Default, Deserialize)]
pub struct RawCompletion {
    #[serde(default)]
    pub choices: Option<Value>,

    #[serde(default)]
    pub usage: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub id: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub created: Option<Option<Value>>,

    #[serde(default, deserialize_with = "present")]
    pub model: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub system_fingerprint: Option<Option<String>>,

    /// Kept from the target, never copied
    #[serde(default)]
    pub object: Option<Value>,

    /// Every key outside the canonical field set
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawCompletion {
    /// The `choices` array; missing, null or non-array is malformed input
    pub fn choice_values(&self) -> NormalizeResult<&Vec<Value>> {
        match &self.choices {
            Some(Value::Array(choices)) => Ok(choices),
            Some(_) => Err(NormalizeError::MalformedInput(
                "'choices' is not a list".to_string(),
            )),
            None => Err(NormalizeError::MalformedInput(
                "'choices' is missing".to_string(),
            )),
        }
    }

    /// Decode `usage` when present and non-null
    pub fn decoded_usage(&self) -> NormalizeResult<Option<Usage>> {
        self.usage
            .as_ref()
            .map(|usage| decode_value(usage, "usage"))
            .transpose()
    }

    /// Counts from `usage`, zero for any missing count
    pub fn zero_filled_usage(&self) -> Option<Usage> {
        let usage = self.usage.as_ref()?;
        let count = |key: &str| {
            usage
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        Some(Usage::new(
            count("prompt_tokens"),
            count("completion_tokens"),
            count("total_tokens"),
        ))
    }
}

/// One entry of `choices`
#[derive(Debug, Deserialize)]
pub struct RawChoice {
    pub message: RawMessage,

    #[serde(default)]
    pub finish_reason: Option<String>,

    /// gpt-4-vision reports a string or `{"type": ...}` here instead
    #[serde(default)]
    pub finish_details: Option<Value>,

    #[serde(default)]
    pub logprobs: Option<Value>,

    #[serde(default)]
    pub enhancements: Option<Value>,
}

impl RawChoice {
    fn finish_details_text(&self) -> Option<&str> {
        match self.finish_details.as_ref()? {
            Value::String(text) => Some(text.as_str()),
            Value::Object(details) => details.get("type").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Non-streaming order: `finish_reason` (even if empty), then a non-empty
    /// `finish_details`, then `"stop"`. The result is still unmapped.
    pub fn finish_reason_or_default(&self) -> String {
        match &self.finish_reason {
            Some(reason) => reason.clone(),
            None => first_non_empty([self.finish_details_text()])
                .unwrap_or("stop")
                .to_string(),
        }
    }

    /// Streaming order: `finish_reason`, then `finish_details`, else absent
    pub fn finish_reason_or_details(&self) -> Option<String> {
        self.finish_reason
            .clone()
            .or_else(|| self.finish_details_text().map(str::to_string))
    }
}

/// `choices[i].message`
#[derive(Debug, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub role: Option<String>,

    /// Text, content parts, or anything else the provider sent
    #[serde(default)]
    pub content: Option<MessageContent>,

    #[serde(default)]
    pub function_call: Option<RawFunction>,

    /// Left untyped: the streaming path inspects entries before typing them
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,

    #[serde(default)]
    pub audio: Option<Value>,
}

impl RawMessage {
    /// `role`, or `"assistant"` when absent or empty
    pub fn role_or_default(&self) -> String {
        first_non_empty([self.role.as_deref()])
            .unwrap_or("assistant")
            .to_string()
    }

    /// Typed tool calls, `None` when the message carries none
    pub fn typed_tool_calls(&self) -> NormalizeResult<Option<Vec<ToolCall>>> {
        let Some(entries) = &self.tool_calls else {
            return Ok(None);
        };
        entries
            .iter()
            .map(|entry| {
                decode_value::<RawToolCall>(entry, "tool call").map(RawToolCall::into_tool_call)
            })
            .collect::<NormalizeResult<Vec<_>>>()
            .map(Some)
    }

    /// Whether the first tool call carries a non-null `function.arguments`,
    /// even an empty one
    pub fn first_tool_call_has_arguments(&self) -> bool {
        self.tool_calls
            .as_ref()
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get("function"))
            .and_then(|function| function.get("arguments"))
            .is_some_and(|arguments| !arguments.is_null())
    }

    /// Streaming tool calls: entries without an `index` get their position.
    ///
    /// Only applied to a non-empty list whose first entry is an object.
    pub fn delta_tool_calls(&self) -> NormalizeResult<Option<Vec<ToolCallDelta>>> {
        let Some(entries) = &self.tool_calls else {
            return Ok(None);
        };
        // Deltas are typed, so an empty list or one of non-object entries has
        // nothing to carry and is dropped from the chunk
        if !entries.first().is_some_and(Value::is_object) {
            tracing::debug!(entries = entries.len(), "dropping untyped tool call entries");
            return Ok(None);
        }
        entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                decode_value::<RawToolCall>(entry, "tool call delta")
                    .map(|call| call.into_delta(position))
            })
            .collect::<NormalizeResult<Vec<_>>>()
            .map(Some)
    }
}

/// `function` / `function_call` object
#[derive(Debug, Default, Deserialize)]
pub struct RawFunction {
    #[serde(default)]
    pub name: Option<String>,

    /// Usually a JSON string, some providers send the object itself
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl RawFunction {
    pub fn into_function_call(self) -> FunctionCall {
        FunctionCall {
            arguments: self
                .arguments
                .as_ref()
                .and_then(argument_text)
                .unwrap_or_default(),
            name: self.name.unwrap_or_default(),
        }
    }

    pub fn into_delta(self) -> FunctionCallDelta {
        FunctionCallDelta {
            arguments: self.arguments.as_ref().and_then(argument_text),
            name: self.name,
        }
    }
}

/// One entry of `message.tool_calls`
#[derive(Debug, Default, Deserialize)]
pub struct RawToolCall {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, rename = "type")]
    pub tool_type: Option<String>,

    #[serde(default)]
    pub function: Option<RawFunction>,

    #[serde(default)]
    pub index: Option<usize>,
}

impl RawToolCall {
    /// Complete tool call; missing ids are generated, missing type is "function"
    pub fn into_tool_call(self) -> ToolCall {
        let id = match first_non_empty([self.id.as_deref()]) {
            Some(id) => id.to_string(),
            None => format!("call_{}", Uuid::new_v4().simple()),
        };
        ToolCall {
            id,
            tool_type: self.tool_type.unwrap_or_else(|| "function".to_string()),
            function: self.function.unwrap_or_default().into_function_call(),
        }
    }

    pub fn into_delta(self, position: usize) -> ToolCallDelta {
        ToolCallDelta {
            index: self.index.unwrap_or(position),
            id: self.id,
            tool_type: self.tool_type,
            function: self.function.map(RawFunction::into_delta),
        }
    }
}

/// Image generation payload
#[derive(Debug, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "present")]
    pub created: Option<Option<Value>>,

    #[serde(default, deserialize_with = "present")]
    pub data: Option<Option<Vec<Value>>>,
}

/// Audio transcription payload
#[derive(Debug, Default, Deserialize)]
pub struct RawTranscription {
    #[serde(default, deserialize_with = "present")]
    pub text: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub language: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub task: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub duration: Option<Option<f64>>,

    #[serde(default, deserialize_with = "present")]
    pub words: Option<Option<Vec<Value>>>,

    #[serde(default, deserialize_with = "present")]
    pub segments: Option<Option<Vec<Value>>>,
}

/// Embedding payload
#[derive(Debug, Default, Deserialize)]
pub struct RawEmbedding {
    #[serde(default, deserialize_with = "present")]
    pub model: Option<Option<String>>,

    #[serde(default)]
    pub object: Option<String>,

    #[serde(default)]
    pub data: Option<Vec<Value>>,

    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Rerank payload
#[derive(Debug, Default, Deserialize)]
pub struct RawRerank {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub results: Option<Vec<RerankResult>>,

    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}
