//! Embedding response assembly

use super::error::{NormalizeError, NormalizeResult};
use super::raw::{decode_payload, RawEmbedding, RawPayload};
use super::timing::{elapsed_ms, Timestamp};
use crate::protocol::{EmbeddingResponse, HiddenParams, ResponseHeaders};

/// Build an embedding response from `payload`, starting from `target` when
/// one is supplied
pub fn assemble_embedding(
    payload: Option<&RawPayload>,
    target: Option<&EmbeddingResponse>,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    hidden_params: HiddenParams,
    response_headers: Option<&ResponseHeaders>,
) -> NormalizeResult<EmbeddingResponse> {
    let payload = payload
        .ok_or_else(|| NormalizeError::MalformedInput("response object is missing".to_string()))?;
    let raw: RawEmbedding = decode_payload(payload, "embedding payload")?;

    let mut response = target.cloned().unwrap_or_default();
    if let Some(model) = raw.model {
        response.model = model;
    }
    if let Some(object) = raw.object {
        response.object = object;
    }
    if let Some(data) = raw.data {
        response.data = data;
    }
    if let Some(usage) = raw.usage {
        response.usage = Some(usage);
    }

    response.hidden_params = hidden_params;
    if let Some(ms) = elapsed_ms(start_time, end_time) {
        response.hidden_params.response_ms = Some(ms);
    }
    if let Some(headers) = response_headers {
        response.response_headers = Some(headers.clone());
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Usage;
    use serde_json::{json, Value};

    fn payload(value: Value) -> RawPayload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_embedding_fields_are_copied() {
        let raw = payload(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2]}],
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        }));

        let response =
            assemble_embedding(Some(&raw), None, None, None, HiddenParams::default(), None)
                .unwrap();

        assert_eq!(response.model.as_deref(), Some("text-embedding-3-small"));
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0]["embedding"], json!([0.1, 0.2]));
        assert_eq!(response.usage, Some(Usage::new(4, 0, 4)));
    }

    #[test]
    fn test_target_model_kept_when_payload_has_none() {
        let target = EmbeddingResponse {
            model: Some("cohere/embed-english".to_string()),
            ..Default::default()
        };
        let raw = payload(json!({"data": []}));

        let response =
            assemble_embedding(Some(&raw), Some(&target), None, None, HiddenParams::default(), None)
                .unwrap();

        assert_eq!(response.model.as_deref(), Some("cohere/embed-english"));
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_target_data_kept_when_payload_has_none() {
        let target = EmbeddingResponse {
            data: vec![json!({"object": "embedding", "index": 0, "embedding": [0.5]})],
            ..Default::default()
        };
        let raw = payload(json!({"usage": {"prompt_tokens": 2, "total_tokens": 2}}));

        let response =
            assemble_embedding(Some(&raw), Some(&target), None, None, HiddenParams::default(), None)
                .unwrap();

        assert_eq!(response.data, target.data);
        assert_eq!(response.usage, Some(Usage::new(2, 0, 2)));
    }

    #[test]
    fn test_missing_payload() {
        let err = assemble_embedding(None, None, None, None, HiddenParams::default(), None)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedInput(_)));
    }
}
