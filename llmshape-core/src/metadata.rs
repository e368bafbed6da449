//! Helpers over the request arguments that travel alongside a payload

use serde_json::{Map, Value};

/// Key of the per-request parameter bag
pub const REQUEST_PARAMS_KEY: &str = "litellm_params";

/// Key under which callers pass the parent tracing span
pub const PARENT_SPAN_KEY: &str = "litellm_parent_otel_span";

/// `litellm_params.metadata` of the request, empty when absent
pub fn request_metadata(kwargs: &Map<String, Value>) -> Map<String, Value> {
    kwargs
        .get(REQUEST_PARAMS_KEY)
        .and_then(|params| params.get("metadata"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Parent span handle of the request.
///
/// Looked up in `metadata`, then `litellm_params.metadata`, then the top
/// level.
pub fn parent_otel_span(kwargs: Option<&Map<String, Value>>) -> Option<&Value> {
    let kwargs = kwargs?;

    span_in(kwargs.get("metadata"))
        .or_else(|| span_in(kwargs.get(REQUEST_PARAMS_KEY).and_then(|p| p.get("metadata"))))
        .or_else(|| kwargs.get(PARENT_SPAN_KEY))
}

fn span_in(container: Option<&Value>) -> Option<&Value> {
    container
        .and_then(Value::as_object)
        .and_then(|metadata| metadata.get(PARENT_SPAN_KEY))
}

/// Drop streaming `index` keys from tool calls before they are sent back to a
/// provider, both from the loose `tool_calls` list and from every message
pub fn strip_tool_call_indices(messages: &mut [Value], tool_calls: &mut [Value]) {
    let strip = |call: &mut Value| {
        if let Some(call) = call.as_object_mut() {
            call.remove("index");
        }
    };

    tool_calls.iter_mut().for_each(strip);

    for message in messages.iter_mut() {
        if let Some(calls) = message.get_mut("tool_calls").and_then(Value::as_array_mut) {
            calls.iter_mut().for_each(strip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("kwargs must be an object"),
        }
    }

    #[test]
    fn test_request_metadata() {
        let args = kwargs(json!({"litellm_params": {"metadata": {"user": "u1"}}}));
        assert_eq!(request_metadata(&args).get("user"), Some(&json!("u1")));

        assert!(request_metadata(&kwargs(json!({}))).is_empty());
        assert!(request_metadata(&kwargs(json!({"litellm_params": {}}))).is_empty());
    }

    #[test]
    fn test_parent_span_lookup_order() {
        let args = kwargs(json!({
            "metadata": {"litellm_parent_otel_span": "outer"},
            "litellm_params": {"metadata": {"litellm_parent_otel_span": "params"}},
            "litellm_parent_otel_span": "top"
        }));
        assert_eq!(parent_otel_span(Some(&args)), Some(&json!("outer")));

        let args = kwargs(json!({
            "metadata": null,
            "litellm_params": {"metadata": {"litellm_parent_otel_span": "params"}},
            "litellm_parent_otel_span": "top"
        }));
        assert_eq!(parent_otel_span(Some(&args)), Some(&json!("params")));

        let args = kwargs(json!({"litellm_params": {"metadata": null}, "litellm_parent_otel_span": "top"}));
        assert_eq!(parent_otel_span(Some(&args)), Some(&json!("top")));

        assert_eq!(parent_otel_span(Some(&kwargs(json!({})))), None);
        assert_eq!(parent_otel_span(None), None);
    }

    #[test]
    fn test_strip_tool_call_indices() {
        let mut messages = vec![
            json!({"role": "assistant", "tool_calls": [{"id": "a", "index": 0}]}),
            json!({"role": "user", "content": "hi"}),
        ];
        let mut tool_calls = vec![json!({"id": "b", "index": 1}), json!("not an object")];

        strip_tool_call_indices(&mut messages, &mut tool_calls);

        assert_eq!(messages[0]["tool_calls"][0], json!({"id": "a"}));
        assert_eq!(messages[1], json!({"role": "user", "content": "hi"}));
        assert_eq!(tool_calls[0], json!({"id": "b"}));
        assert_eq!(tool_calls[1], json!("not an object"));
    }
}
