//! Finish reason normalization
//!
//! Providers report why generation stopped with their own vocabulary. This maps
//! the known codes onto OpenAI's set (`stop`, `length`, `tool_calls`,
//! `content_filter`). Unknown codes are returned unchanged so new provider
//! values still reach callers.

/// Map a provider finish reason onto the canonical vocabulary
pub fn map_finish_reason(reason: &str) -> String {
    let canonical = match reason {
        // anthropic, cohere, huggingface, vertex ai
        "stop_sequence" | "COMPLETE" | "eos_token" | "FINISH_REASON_UNSPECIFIED" | "STOP"
        | "end_turn" => "stop",
        "MAX_TOKENS" | "max_tokens" => "length",
        "ERROR_TOXIC" | "SAFETY" | "RECITATION" | "content_filtered" => "content_filter",
        // no openai equivalent for an error stop
        "ERROR" => "stop",
        "tool_use" => "tool_calls",
        other => other,
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("stop_sequence", "stop")]
    #[test_case("COMPLETE", "stop")]
    #[test_case("eos_token", "stop")]
    #[test_case("FINISH_REASON_UNSPECIFIED", "stop")]
    #[test_case("STOP", "stop")]
    #[test_case("end_turn", "stop")]
    #[test_case("MAX_TOKENS", "length")]
    #[test_case("max_tokens", "length")]
    #[test_case("ERROR_TOXIC", "content_filter")]
    #[test_case("SAFETY", "content_filter")]
    #[test_case("RECITATION", "content_filter")]
    #[test_case("content_filtered", "content_filter")]
    #[test_case("ERROR", "stop")]
    #[test_case("tool_use", "tool_calls")]
    fn test_known_reasons(input: &str, expected: &str) {
        assert_eq!(map_finish_reason(input), expected);
    }

    #[test_case("stop")]
    #[test_case("length")]
    #[test_case("function_call")]
    #[test_case("OTHER")]
    #[test_case("")]
    fn test_unknown_reasons_pass_through(input: &str) {
        assert_eq!(map_finish_reason(input), input);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(map_finish_reason("End_Turn"), "End_Turn");
        assert_eq!(map_finish_reason("safety"), "safety");
    }
}
