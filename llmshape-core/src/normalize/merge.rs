//! Merging assembled fields into a caller-supplied response
//!
//! Callers may hand in a partially built response (typically with the routed
//! model name already set). It is never mutated: the assembler produces a
//! `CompletionUpdate` and `merge_completion` returns a new response.

use crate::protocol::{Choice, HiddenParams, ModelResponse, ResponseHeaders, Usage};
use serde_json::{Map, Value};

/// Fields assembled from one completion payload.
///
/// `None` means "the payload did not carry this key; keep the existing value".
#[derive(Debug, Clone, Default)]
pub struct CompletionUpdate {
    pub choices: Vec<Choice>,

    pub usage: Option<Usage>,

    pub id: Option<String>,

    pub created: Option<i64>,

    /// Outer: key present; inner: non-null
    pub model: Option<Option<String>>,

    pub system_fingerprint: Option<Option<String>>,

    /// Caller hidden params, merged headers and latency
    pub hidden_params: HiddenParams,

    pub response_headers: Option<ResponseHeaders>,

    /// Non-canonical payload keys
    pub extra: Map<String, Value>,
}

/// Resolve the model name of a merged response.
///
/// - no existing model: adopt the payload model
/// - existing model with a `provider/` prefix and a payload model:
///   `<provider>/<payload model>`
/// - otherwise the existing model stays
pub fn merge_model_name(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match (existing, incoming) {
        (None, incoming) => incoming.map(str::to_string),
        (Some(current), Some(model)) if current.contains('/') => {
            let provider = current.split('/').next().unwrap_or_default();
            Some(format!("{}/{}", provider, model))
        }
        (Some(current), _) => Some(current.to_string()),
    }
}

/// Build a new response from `existing` overlaid with `update`
pub fn merge_completion(
    existing: Option<&ModelResponse>,
    update: CompletionUpdate,
) -> ModelResponse {
    let mut merged = existing.cloned().unwrap_or_default();

    merged.choices = update.choices;
    if let Some(usage) = update.usage {
        merged.usage = Some(usage);
    }
    if let Some(id) = update.id {
        merged.id = id;
    }
    if let Some(created) = update.created {
        merged.created = created;
    }
    if let Some(fingerprint) = update.system_fingerprint {
        merged.system_fingerprint = fingerprint;
    }
    if let Some(model) = update.model {
        merged.model = merge_model_name(merged.model.as_deref(), model.as_deref());
    }

    merged.hidden_params = merged.hidden_params.merged_with(update.hidden_params);
    if update.response_headers.is_some() {
        merged.response_headers = update.response_headers;
    }
    merged.extra.extend(update.extra);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_prefix_is_preserved() {
        assert_eq!(
            merge_model_name(Some("azure/gpt-4"), Some("gpt-4-0613")).as_deref(),
            Some("azure/gpt-4-0613")
        );
        assert_eq!(
            merge_model_name(Some("openrouter/meta/llama"), Some("llama-3")).as_deref(),
            Some("openrouter/llama-3")
        );
    }

    #[test]
    fn test_model_adopted_when_missing() {
        assert_eq!(merge_model_name(None, Some("gpt-4")).as_deref(), Some("gpt-4"));
        assert_eq!(merge_model_name(None, None), None);
    }

    #[test]
    fn test_existing_model_wins_without_prefix() {
        assert_eq!(merge_model_name(Some("gpt-4"), Some("gpt-4-0613")).as_deref(), Some("gpt-4"));
        assert_eq!(merge_model_name(Some("azure/gpt-4"), None).as_deref(), Some("azure/gpt-4"));
    }

    #[test]
    fn test_merge_leaves_existing_untouched() {
        let mut existing = ModelResponse::new().with_model("azure/gpt-4");
        existing.hidden_params.extra.insert("region".to_string(), json!("eu"));
        let snapshot = existing.clone();

        let mut update = CompletionUpdate {
            id: Some("chatcmpl-1".to_string()),
            model: Some(Some("gpt-4-0613".to_string())),
            ..Default::default()
        };
        update.hidden_params.extra.insert("api_base".to_string(), json!("https://x"));

        let merged = merge_completion(Some(&existing), update);

        assert_eq!(existing, snapshot);
        assert_eq!(merged.id, "chatcmpl-1");
        assert_eq!(merged.model.as_deref(), Some("azure/gpt-4-0613"));
        assert_eq!(merged.hidden_params.extra["region"], json!("eu"));
        assert_eq!(merged.hidden_params.extra["api_base"], json!("https://x"));
        assert_eq!(merged.created, existing.created);
    }

    #[test]
    fn test_absent_fields_keep_existing_values() {
        let mut existing = ModelResponse::new();
        existing.system_fingerprint = Some("fp_old".to_string());
        existing.usage = Some(Usage::new(1, 2, 3));

        let merged = merge_completion(Some(&existing), CompletionUpdate::default());

        assert_eq!(merged.system_fingerprint.as_deref(), Some("fp_old"));
        assert_eq!(merged.usage, Some(Usage::new(1, 2, 3)));
        assert_eq!(merged.id, existing.id);
    }
}
