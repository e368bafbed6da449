//! Integration tests for configuration loading and validation

use llmshape_core::config::{load_from_json, load_from_yaml, ConfigError, NormalizerConfig};
use llmshape_core::{AssembleOptions, ResponseKind, ResponseNormalizer};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    use std::env;
    env::set_var("LLMSHAPE_GATEWAY_PREFIX", "gateway");

    let yaml = r#"
provider_header_prefix: ${LLMSHAPE_GATEWAY_PREFIX}
default_error_status: 500
coerce_single_tool_call_to_json_mode: true
max_diagnostic_keys: 8
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    let config = load_from_yaml(path).unwrap();
    assert_eq!(config.provider_header_prefix, "gateway");
    assert_eq!(config.default_error_status, 500);
    assert!(config.coerce_single_tool_call_to_json_mode);
    assert!(config.repair_parallel_tool_calls);
    assert_eq!(config.max_diagnostic_keys, 8);

    env::remove_var("LLMSHAPE_GATEWAY_PREFIX");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
  "provider_header_prefix": "upstream",
  "repair_parallel_tool_calls": false
}"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.provider_header_prefix, "upstream");
    assert!(!config.repair_parallel_tool_calls);
    assert_eq!(config.default_error_status, 422);
}

#[test]
fn test_empty_document_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", "{}");

    assert_eq!(load_from_json(path).unwrap(), NormalizerConfig::default());
}

#[test]
fn test_missing_env_var() {
    let yaml = "provider_header_prefix: ${LLMSHAPE_UNSET_PREFIX_VAR}\n";

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "LLMSHAPE_UNSET_PREFIX_VAR"),
        other => panic!("Expected EnvVarNotFound error, got {other:?}"),
    }
}

#[test]
fn test_unknown_field_is_a_parse_error() {
    let yaml = "provider_header_prefix: gateway\nretries: 3\n";

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { message, .. }) => assert!(message.contains("retries")),
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_invalid_status_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", r#"{"default_error_status": 200}"#);

    match load_from_json(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "default_error_status");
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

#[test]
fn test_invalid_prefix_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "provider_header_prefix: \"-bad\"\n");

    let err = load_from_yaml(path).unwrap_err();
    assert!(err.to_string().contains("provider_header_prefix"));
}

#[test]
fn test_missing_file() {
    let result = load_from_yaml("/nonexistent/llmshape.yaml");
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}

#[test]
fn test_loaded_prefix_namespaces_headers() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "provider_header_prefix: gateway\n");
    let normalizer = ResponseNormalizer::new(load_from_yaml(path).unwrap());

    let payload = json!({"choices": [{"message": {"content": "hi"}}]});
    let headers = HashMap::from([("x-request-id".to_string(), "abc".to_string())]);

    let response = normalizer
        .assemble(
            payload.as_object(),
            ResponseKind::Completion(None),
            AssembleOptions::new().with_response_headers(headers),
        )
        .unwrap()
        .into_completion()
        .unwrap();

    let merged = response.hidden_params.additional_headers.unwrap();
    assert_eq!(merged.get("gateway-x-request-id").map(String::as_str), Some("abc"));
}
