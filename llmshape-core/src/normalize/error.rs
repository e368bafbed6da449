//! Normalization error types and handling

use std::fmt;
use thiserror::Error;

/// Result type for normalization operations
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Errors raised while turning a provider payload into a canonical response
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload itself carried an `error` object
    #[error("Upstream error ({status_code}): {message}")]
    Upstream { status_code: u16, message: String },

    /// Payload absent or a required field missing/wrong-shaped
    #[error("Error in response object format: {0}")]
    MalformedInput(String),

    /// A field was present but could not be decoded
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Arguments of a packed parallel tool call were not valid JSON
    #[error("Invalid arguments for tool call '{name}': {source}")]
    InvalidToolCall {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any failure inside assembly, wrapped once at the entry point
    #[error("Invalid response object: {source}\n\n{context}")]
    Assembly {
        context: Box<DiagnosticContext>,
        #[source]
        source: Box<NormalizeError>,
    },
}

impl NormalizeError {
    /// Helper for decode failures
    pub(crate) fn decode(what: &'static str, source: serde_json::Error) -> Self {
        NormalizeError::Decode { what, source }
    }

    /// The innermost error, looking through the assembly wrapper
    pub fn root_cause(&self) -> &NormalizeError {
        match self {
            NormalizeError::Assembly { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// HTTP-ish status code for this error, if it carries one
    pub fn status_code(&self) -> Option<u16> {
        match self.root_cause() {
            NormalizeError::Upstream { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        NormalizeError::decode("payload", err)
    }
}

/// Bounded diagnostic snapshot of an assembly call.
///
/// Holds the shape of the call, never the payload values.
#[derive(Debug, Clone)]
pub struct DiagnosticContext {
    /// Response kind being assembled
    pub kind: &'static str,

    pub stream: bool,

    /// Top-level payload keys, truncated to the configured limit
    pub payload_keys: Vec<String>,

    /// Number of keys dropped by the truncation
    pub omitted_keys: usize,

    /// Length of `choices` when it was an array
    pub choice_count: Option<usize>,

    pub has_target: bool,

    pub has_headers: bool,

    /// Rendered backtrace (empty unless RUST_BACKTRACE is set)
    pub backtrace: String,
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received_args: kind={}, stream={}, has_target={}, has_headers={}, payload_keys=[{}]",
            self.kind,
            self.stream,
            self.has_target,
            self.has_headers,
            self.payload_keys.join(", ")
        )?;
        if self.omitted_keys > 0 {
            write!(f, " (+{} more)", self.omitted_keys)?;
        }
        if let Some(count) = self.choice_count {
            write!(f, ", choices={}", count)?;
        }
        if !self.backtrace.is_empty() {
            write!(f, "\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DiagnosticContext {
        DiagnosticContext {
            kind: "completion",
            stream: false,
            payload_keys: vec!["choices".to_string(), "id".to_string()],
            omitted_keys: 3,
            choice_count: Some(2),
            has_target: true,
            has_headers: false,
            backtrace: String::new(),
        }
    }

    #[test]
    fn test_root_cause_looks_through_wrapper() {
        let err = NormalizeError::Assembly {
            context: Box::new(context()),
            source: Box::new(NormalizeError::Upstream {
                status_code: 429,
                message: "slow down".to_string(),
            }),
        };

        assert!(matches!(err.root_cause(), NormalizeError::Upstream { .. }));
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn test_assembly_display_includes_context() {
        let err = NormalizeError::Assembly {
            context: Box::new(context()),
            source: Box::new(NormalizeError::MalformedInput("choices missing".to_string())),
        };

        let rendered = err.to_string();
        assert!(rendered.starts_with("Invalid response object: Error in response object format"));
        assert!(rendered.contains("payload_keys=[choices, id] (+3 more)"));
        assert!(rendered.contains("choices=2"));
        assert_eq!(err.status_code(), None);
    }
}
