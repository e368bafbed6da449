//! Response header extraction
//!
//! OpenAI-style rate-limit headers are surfaced as-is; every raw header is also
//! exposed under a provider namespace so nothing the provider sent is lost.

use crate::protocol::ResponseHeaders;
use std::collections::HashMap;

/// Default namespace prepended to raw provider headers
pub const DEFAULT_PROVIDER_HEADER_PREFIX: &str = "llm_provider";

/// Rate-limit headers copied through without a prefix
pub const RATE_LIMIT_HEADERS: [&str; 4] = [
    "x-ratelimit-limit-requests",
    "x-ratelimit-remaining-requests",
    "x-ratelimit-limit-tokens",
    "x-ratelimit-remaining-tokens",
];

/// Copy the recognized rate-limit headers that are present
pub fn extract_rate_limit_headers(headers: &ResponseHeaders) -> HashMap<String, String> {
    RATE_LIMIT_HEADERS
        .iter()
        .filter_map(|key| headers.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// Copy every header under `<prefix>-<key>`
pub fn namespace_provider_headers(
    headers: &ResponseHeaders,
    prefix: &str,
) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| (format!("{}-{}", prefix, key), value.clone()))
        .collect()
}

/// Namespaced headers overlaid with the unprefixed rate-limit headers.
///
/// The rate-limit keys win on collision.
pub fn merge_response_headers(headers: &ResponseHeaders, prefix: &str) -> HashMap<String, String> {
    let mut merged = namespace_provider_headers(headers, prefix);
    merged.extend(extract_rate_limit_headers(headers));
    tracing::trace!(count = merged.len(), "merged response headers");
    merged
}
