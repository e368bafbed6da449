//! Tests for the canonical wire shapes

use llmshape_core::protocol::*;
use serde_json::json;
use std::collections::HashMap;

#[test]
fn test_model_response_defaults() {
    let response = ModelResponse::new();
    assert!(response.id.starts_with("chatcmpl-"));
    assert_eq!(response.object, "chat.completion");
    assert!(response.created > 0);
    assert!(response.model.is_none());

    let other = ModelResponse::default();
    assert_ne!(response.id, other.id);
}

#[test]
fn test_hidden_data_is_not_serialized() {
    let mut response = ModelResponse::new().with_model("gpt-4");
    response.hidden_params.response_ms = Some(12.5);
    response.response_headers = Some(HashMap::from([("x".to_string(), "y".to_string())]));

    let wire = serde_json::to_value(&response).unwrap();
    assert!(wire.get("hidden_params").is_none());
    assert!(wire.get("response_headers").is_none());
    assert!(wire.get("usage").is_none());
    assert_eq!(wire["model"], json!("gpt-4"));
}

#[test]
fn test_choice_wire_shape() {
    let choice = Choice {
        index: 0,
        finish_reason: "tool_calls".to_string(),
        message: Message {
            role: "assistant".to_string(),
            content: None,
            function_call: None,
            tool_calls: Some(vec![ToolCall::function("call_1", "lookup", "{}")]),
            audio: None,
        },
        logprobs: None,
        enhancements: None,
    };

    let wire = serde_json::to_value(&choice).unwrap();
    assert_eq!(wire["message"]["tool_calls"][0]["type"], json!("function"));
    assert_eq!(wire["message"]["tool_calls"][0]["function"]["name"], json!("lookup"));
    assert!(wire.get("logprobs").is_none());
}

#[test]
fn test_usage_keeps_provider_details() {
    let usage: Usage = serde_json::from_value(json!({
        "prompt_tokens": 10,
        "completion_tokens": 5,
        "total_tokens": 15,
        "prompt_tokens_details": {"cached_tokens": 8}
    }))
    .unwrap();

    assert_eq!(usage.total_tokens, 15);
    assert_eq!(usage.extra["prompt_tokens_details"]["cached_tokens"], json!(8));

    let wire = serde_json::to_value(&usage).unwrap();
    assert_eq!(wire["prompt_tokens_details"]["cached_tokens"], json!(8));
}

#[test]
fn test_hidden_params_merge() {
    let mut base = HiddenParams::default();
    base.response_ms = Some(1.0);
    base.extra.insert("model_id".to_string(), json!("a"));

    let mut overlay = HiddenParams::default();
    overlay.extra.insert("api_base".to_string(), json!("b"));

    let merged = base.merged_with(overlay);
    assert_eq!(merged.response_ms, Some(1.0));
    assert_eq!(merged.extra.len(), 2);
    assert!(HiddenParams::default().is_empty());
    assert!(!merged.is_empty());
}

#[test]
fn test_streaming_chunk_shape() {
    let mut chunk = StreamingResponse::new();
    chunk.choices.push(StreamingChoice {
        index: 0,
        delta: Delta {
            content: Some("hi".into()),
            ..Default::default()
        },
        finish_reason: None,
        logprobs: None,
        enhancements: None,
    });

    let wire = serde_json::to_value(&chunk).unwrap();
    assert_eq!(wire["object"], json!("chat.completion.chunk"));
    assert_eq!(wire["choices"][0]["delta"], json!({"content": "hi"}));
}
