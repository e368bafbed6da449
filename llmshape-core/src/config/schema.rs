//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::normalize::headers::DEFAULT_PROVIDER_HEADER_PREFIX;
use serde::{Deserialize, Serialize};

/// Root configuration for the response normalizer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Namespace for raw provider headers in hidden params
    #[serde(default = "default_header_prefix")]
    pub provider_header_prefix: String,

    /// Status reported for an upstream `error` without a numeric code
    #[serde(default = "default_error_status")]
    pub default_error_status: u16,

    /// Turn a single tool call into JSON-mode content unless a call overrides it
    #[serde(default)]
    pub coerce_single_tool_call_to_json_mode: bool,

    /// Expand `multi_tool_use.parallel` calls.
    ///
    /// When disabled, packed calls reach callers as a single tool call to a
    /// function that does not exist.
    #[serde(default = "default_true")]
    pub repair_parallel_tool_calls: bool,

    /// Upper bound on payload keys recorded in assembly diagnostics
    #[serde(default = "default_max_diagnostic_keys")]
    pub max_diagnostic_keys: usize,
}

fn default_header_prefix() -> String {
    DEFAULT_PROVIDER_HEADER_PREFIX.to_string()
}

fn default_error_status() -> u16 {
    422
}

fn default_true() -> bool {
    true
}

fn default_max_diagnostic_keys() -> usize {
    32
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            provider_header_prefix: default_header_prefix(),
            default_error_status: default_error_status(),
            coerce_single_tool_call_to_json_mode: false,
            repair_parallel_tool_calls: true,
            max_diagnostic_keys: default_max_diagnostic_keys(),
        }
    }
}

impl NormalizerConfig {
    /// Built-in field validation
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider_header_prefix.is_empty() {
            return Err(ValidationError::required("provider_header_prefix"));
        }
        if self.provider_header_prefix.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "provider_header_prefix",
                "header prefix must not contain whitespace",
            ));
        }

        if !(400..=599).contains(&self.default_error_status) {
            return Err(ValidationError::out_of_range(
                "default_error_status",
                format!("{} is not an HTTP error status", self.default_error_status),
            ));
        }

        if self.max_diagnostic_keys == 0 {
            return Err(ValidationError::new(
                "max_diagnostic_keys",
                ValidationErrorKind::OutOfRange {
                    message: "must be greater than 0".to_string(),
                },
            ));
        }

        Ok(())
    }
}
