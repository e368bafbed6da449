//! Repair of hallucinated parallel tool calls
//!
//! OpenAI models occasionally pack several tool calls into one call to a
//! function that does not exist, `multi_tool_use.parallel`, whose arguments
//! look like:
//!
//! ```json
//! {"tool_uses": [{"recipient_name": "functions.get_weather", "parameters": {"city": "Paris"}}]}
//! ```
//!
//! Each packed entry is unpacked into a real tool call at the position of the
//! packed call.

use super::error::{NormalizeError, NormalizeResult};
use crate::protocol::ToolCall;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;

/// Name of the pseudo-function carrying packed calls
pub const PARALLEL_TOOL_CALL_NAME: &str = "multi_tool_use.parallel";

/// Namespace the model puts in front of real function names
const FUNCTIONS_PREFIX: &str = "functions.";

#[derive(Debug, Deserialize)]
struct PackedToolUses {
    tool_uses: Vec<PackedToolUse>,
}

#[derive(Debug, Deserialize)]
struct PackedToolUse {
    recipient_name: String,
    parameters: Value,
}

fn is_packed(call: &ToolCall) -> bool {
    call.function.name == PARALLEL_TOOL_CALL_NAME
}

/// Expand every packed parallel call in place.
///
/// Calls without the sentinel name keep their relative order. When nothing is
/// packed the input slice is handed back borrowed and untouched.
pub fn repair_parallel_tool_calls(calls: &[ToolCall]) -> NormalizeResult<Cow<'_, [ToolCall]>> {
    if !calls.iter().any(is_packed) {
        return Ok(Cow::Borrowed(calls));
    }

    let mut repaired = Vec::with_capacity(calls.len());
    for call in calls {
        if is_packed(call) {
            tracing::debug!(id = %call.id, "expanding packed parallel tool call");
            repaired.extend(expand_packed_call(call)?);
        } else {
            repaired.push(call.clone());
        }
    }

    Ok(Cow::Owned(repaired))
}

/// Unpack one sentinel call; ids are `<original-id>_<position>`
fn expand_packed_call(call: &ToolCall) -> NormalizeResult<Vec<ToolCall>> {
    let packed: PackedToolUses =
        serde_json::from_str(&call.function.arguments).map_err(|source| {
            NormalizeError::InvalidToolCall {
                name: call.function.name.clone(),
                source,
            }
        })?;

    let mut expanded = Vec::with_capacity(packed.tool_uses.len());
    for (position, tool_use) in packed.tool_uses.into_iter().enumerate() {
        let name = tool_use
            .recipient_name
            .strip_prefix(FUNCTIONS_PREFIX)
            .unwrap_or(&tool_use.recipient_name);
        if name == PARALLEL_TOOL_CALL_NAME {
            tracing::warn!(id = %call.id, position, "dropping nested packed tool call");
            continue;
        }
        expanded.push(ToolCall::function(
            format!("{}_{}", call.id, position),
            name,
            tool_use.parameters.to_string(),
        ));
    }

    Ok(expanded)
}
