//! Rerank response assembly

use super::error::{NormalizeError, NormalizeResult};
use super::raw::{decode_payload, RawPayload, RawRerank};
use crate::protocol::RerankResponse;

/// Build a rerank response from `payload`, starting from `target` when one is
/// supplied
pub fn assemble_rerank(
    payload: Option<&RawPayload>,
    target: Option<&RerankResponse>,
) -> NormalizeResult<RerankResponse> {
    let payload = payload
        .ok_or_else(|| NormalizeError::MalformedInput("response object is missing".to_string()))?;
    let raw: RawRerank = decode_payload(payload, "rerank payload")?;

    let mut response = target.cloned().unwrap_or_default();
    if let Some(id) = raw.id {
        response.id = id;
    }
    if raw.results.is_some() {
        response.results = raw.results;
    }
    if let Some(meta) = raw.meta {
        response.meta = meta;
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn payload(value: Value) -> RawPayload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_rerank_results() {
        let raw = payload(json!({
            "id": "rr-1",
            "results": [
                {"index": 2, "relevance_score": 0.91, "document": {"text": "b"}},
                {"index": 0, "relevance_score": 0.12}
            ],
            "meta": {"billed_units": {"search_units": 1}}
        }));

        let response = assemble_rerank(Some(&raw), None).unwrap();
        let results = response.results.unwrap();

        assert_eq!(response.id, "rr-1");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 2);
        assert_eq!(results[1].document, None);
        assert_eq!(response.meta["billed_units"]["search_units"], json!(1));
    }

    #[test]
    fn test_generated_id_when_absent() {
        let raw = payload(json!({"results": []}));

        let response = assemble_rerank(Some(&raw), None).unwrap();
        assert!(!response.id.is_empty());
        assert_eq!(response.results, Some(vec![]));
    }

    #[test]
    fn test_wrong_result_shape_is_decode_error() {
        let raw = payload(json!({"results": [{"index": "first"}]}));

        let err = assemble_rerank(Some(&raw), None).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode { what: "rerank payload", .. }));
    }
}
