//! Configuration validation utilities

use super::error::ValidationError;
use super::schema::NormalizerConfig;
use regex::Regex;

/// Configuration validator with additional validation rules
pub struct ConfigValidator {
    /// Characters allowed in a header namespace
    header_prefix_pattern: Regex,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self {
            header_prefix_pattern: Regex::new(r"^[A-Za-z0-9_.]+(-[A-Za-z0-9_.]+)*$")
                .expect("header prefix pattern is a valid regex"),
        }
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &NormalizerConfig) -> Result<(), ValidationError> {
        config.validate()?;
        self.validate_header_prefix(config)?;
        Ok(())
    }

    /// The prefix is joined to header names with `-`, so it must be a token
    /// that neither starts nor ends with one
    fn validate_header_prefix(&self, config: &NormalizerConfig) -> Result<(), ValidationError> {
        if !self
            .header_prefix_pattern
            .is_match(&config.provider_header_prefix)
        {
            return Err(ValidationError::invalid_format(
                "provider_header_prefix",
                format!("'{}' is not a valid header token", config.provider_header_prefix),
            )
            .with_context("use letters, digits, '_', '.' and inner '-' only"));
        }
        Ok(())
    }
}
