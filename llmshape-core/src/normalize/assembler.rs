//! Response assembly
//!
//! `ResponseNormalizer::assemble` is the single entry point turning a decoded
//! provider payload into a canonical response. The flow is:
//!
//! 1. surface an upstream `error` object, if the payload carries one
//! 2. dispatch on `ResponseKind` (streaming completions go to the replay
//!    adapter, embeddings and rerank to their sibling assemblers)
//! 3. wrap any failure once with a bounded `DiagnosticContext`

use super::embedding::assemble_embedding;
use super::error::{DiagnosticContext, NormalizeError, NormalizeResult};
use super::finish_reason::map_finish_reason;
use super::headers::merge_response_headers;
use super::merge::{merge_completion, CompletionUpdate};
use super::raw::{
    decode_payload, decode_value, first_non_empty, unix_seconds, RawChoice, RawCompletion,
    RawError, RawFunction, RawImage, RawPayload, RawTranscription,
};
use super::rerank::assemble_rerank;
use super::streaming::{to_streaming_response, ReplayStream};
use super::timing::{elapsed_ms, Timestamp};
use super::tool_calls::repair_parallel_tool_calls;
use crate::config::NormalizerConfig;
use crate::protocol::{
    Choice, EmbeddingResponse, HiddenParams, ImageResponse, Message, ModelResponse,
    RerankResponse, ResponseHeaders, ToolCall, TranscriptionResponse,
};
use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use uuid::Uuid;

/// Message used when an upstream error object has no usable `message`
const DEFAULT_UPSTREAM_MESSAGE: &str = "Error in response object";

/// What to build, together with the caller's partially built response of
/// that kind, if any
#[derive(Debug, Clone, Copy)]
pub enum ResponseKind<'a> {
    Completion(Option<&'a ModelResponse>),
    Embedding(Option<&'a EmbeddingResponse>),
    ImageGeneration(Option<&'a ImageResponse>),
    AudioTranscription(Option<&'a TranscriptionResponse>),
    Rerank(Option<&'a RerankResponse>),
}

impl ResponseKind<'_> {
    /// Wire name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKind::Completion(_) => "completion",
            ResponseKind::Embedding(_) => "embedding",
            ResponseKind::ImageGeneration(_) => "image_generation",
            ResponseKind::AudioTranscription(_) => "audio_transcription",
            ResponseKind::Rerank(_) => "rerank",
        }
    }

    fn has_target(&self) -> bool {
        match self {
            ResponseKind::Completion(target) => target.is_some(),
            ResponseKind::Embedding(target) => target.is_some(),
            ResponseKind::ImageGeneration(target) => target.is_some(),
            ResponseKind::AudioTranscription(target) => target.is_some(),
            ResponseKind::Rerank(target) => target.is_some(),
        }
    }
}

/// An assembled response, one variant per kind
#[derive(Debug)]
pub enum CanonicalResponse {
    Completion(ModelResponse),
    /// Completion replayed as a one-chunk stream
    Streaming(ReplayStream),
    Embedding(EmbeddingResponse),
    Image(ImageResponse),
    Transcription(TranscriptionResponse),
    Rerank(RerankResponse),
}

impl CanonicalResponse {
    pub fn into_completion(self) -> Option<ModelResponse> {
        match self {
            CanonicalResponse::Completion(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_streaming(self) -> Option<ReplayStream> {
        match self {
            CanonicalResponse::Streaming(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn into_embedding(self) -> Option<EmbeddingResponse> {
        match self {
            CanonicalResponse::Embedding(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<ImageResponse> {
        match self {
            CanonicalResponse::Image(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_transcription(self) -> Option<TranscriptionResponse> {
        match self {
            CanonicalResponse::Transcription(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_rerank(self) -> Option<RerankResponse> {
        match self {
            CanonicalResponse::Rerank(response) => Some(response),
            _ => None,
        }
    }
}

/// Per-call assembly options
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Replay a completion as a stream
    pub stream: bool,

    pub start_time: Option<Timestamp>,

    pub end_time: Option<Timestamp>,

    /// Caller metadata attached to the response's hidden params
    pub hidden_params: Option<Map<String, Value>>,

    /// Raw provider response headers
    pub response_headers: Option<ResponseHeaders>,

    /// Overrides `NormalizerConfig::coerce_single_tool_call_to_json_mode`
    pub convert_tool_call_to_json_mode: Option<bool>,
}

impl AssembleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a streaming replay
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Record the provider call's start and end
    pub fn with_timing(mut self, start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }

    pub fn with_hidden_params(mut self, params: Map<String, Value>) -> Self {
        self.hidden_params = Some(params);
        self
    }

    pub fn with_response_headers(mut self, headers: ResponseHeaders) -> Self {
        self.response_headers = Some(headers);
        self
    }

    /// Turn a lone tool call into JSON content (for `json_schema` on models
    /// that only support tools)
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.convert_tool_call_to_json_mode = Some(enabled);
        self
    }
}

/// Assemble with the default configuration
pub fn assemble(
    payload: Option<&RawPayload>,
    kind: ResponseKind<'_>,
    options: AssembleOptions,
) -> NormalizeResult<CanonicalResponse> {
    ResponseNormalizer::default().assemble(payload, kind, options)
}

/// Configured response assembler.
///
/// Holds no per-call state; one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    config: NormalizerConfig,
}

impl ResponseNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Build a canonical response of `kind` from `payload`.
    ///
    /// An upstream `error` in the payload is returned as
    /// `NormalizeError::Upstream`; every other failure is wrapped in
    /// `NormalizeError::Assembly`.
    pub fn assemble(
        &self,
        payload: Option<&RawPayload>,
        kind: ResponseKind<'_>,
        options: AssembleOptions,
    ) -> NormalizeResult<CanonicalResponse> {
        if let Some(payload) = payload {
            self.check_upstream_error(payload)?;
        }

        tracing::debug!(kind = kind.name(), stream = options.stream, "assembling response");
        self.dispatch(payload, kind, &options)
            .map_err(|source| NormalizeError::Assembly {
                context: Box::new(self.diagnostics(payload, kind, &options)),
                source: Box::new(source),
            })
    }

    /// Fail with the payload's own error, if it carries one
    pub fn check_upstream_error(&self, payload: &RawPayload) -> NormalizeResult<()> {
        let Some(error) = RawError::from_payload(payload) else {
            return Ok(());
        };

        let status_code = error
            .status_code
            .unwrap_or(self.config.default_error_status);
        let message = error
            .message
            .unwrap_or_else(|| DEFAULT_UPSTREAM_MESSAGE.to_string());
        tracing::warn!(status_code, %message, "provider payload carries an error");

        Err(NormalizeError::Upstream {
            status_code,
            message,
        })
    }

    fn dispatch(
        &self,
        payload: Option<&RawPayload>,
        kind: ResponseKind<'_>,
        options: &AssembleOptions,
    ) -> NormalizeResult<CanonicalResponse> {
        match kind {
            ResponseKind::Completion(target) => {
                let payload = require_payload(payload)?;
                if options.stream {
                    // cached responses replayed to a streaming caller
                    return to_streaming_response(Some(payload)).map(CanonicalResponse::Streaming);
                }
                self.assemble_completion(payload, target, options)
                    .map(CanonicalResponse::Completion)
            }
            ResponseKind::Embedding(target) => assemble_embedding(
                payload,
                target,
                options.start_time,
                options.end_time,
                self.hidden_params(options),
                options.response_headers.as_ref(),
            )
            .map(CanonicalResponse::Embedding),
            ResponseKind::ImageGeneration(target) => self
                .assemble_image(require_payload(payload)?, target, options)
                .map(CanonicalResponse::Image),
            ResponseKind::AudioTranscription(target) => self
                .assemble_transcription(require_payload(payload)?, target, options)
                .map(CanonicalResponse::Transcription),
            ResponseKind::Rerank(target) => {
                assemble_rerank(payload, target).map(CanonicalResponse::Rerank)
            }
        }
    }

    fn assemble_completion(
        &self,
        payload: &RawPayload,
        target: Option<&ModelResponse>,
        options: &AssembleOptions,
    ) -> NormalizeResult<ModelResponse> {
        let raw: RawCompletion = decode_payload(payload, "completion payload")?;
        let json_mode = options
            .convert_tool_call_to_json_mode
            .unwrap_or(self.config.coerce_single_tool_call_to_json_mode);

        let choices = raw
            .choice_values()?
            .iter()
            .enumerate()
            .map(|(index, value)| self.build_choice(index, value, json_mode))
            .collect::<NormalizeResult<Vec<_>>>()?;
        let usage = raw.decoded_usage()?;

        let mut hidden_params = self.hidden_params(options);
        hidden_params.response_ms = elapsed_ms(options.start_time, options.end_time);

        let update = CompletionUpdate {
            choices,
            usage,
            id: raw.id.map(|id| {
                first_non_empty([id.as_deref()])
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string())
            }),
            created: raw.created.map(|created| {
                created
                    .as_ref()
                    .and_then(unix_seconds)
                    .filter(|secs| *secs != 0)
                    .unwrap_or_else(|| chrono::Utc::now().timestamp())
            }),
            model: raw.model,
            system_fingerprint: raw.system_fingerprint,
            hidden_params,
            response_headers: options.response_headers.clone(),
            extra: raw.extra,
        };

        Ok(merge_completion(target, update))
    }

    fn build_choice(&self, index: usize, value: &Value, json_mode: bool) -> NormalizeResult<Choice> {
        let choice: RawChoice = decode_value(value, "choice")?;

        let (tool_calls, repaired) = match choice.message.typed_tool_calls()? {
            Some(calls) if self.config.repair_parallel_tool_calls => {
                let (calls, repaired) = apply_repair(calls)?;
                (Some(calls), repaired)
            }
            other => (other, false),
        };

        // expanded calls always carry arguments; otherwise the lone call is the
        // provider's first one
        let json_content = match &tool_calls {
            Some(calls)
                if json_mode
                    && calls.len() == 1
                    && (repaired || choice.message.first_tool_call_has_arguments()) =>
            {
                Some(calls[0].function.arguments.clone())
            }
            _ => None,
        };

        let (message, finish_reason) = match json_content {
            Some(content) => {
                tracing::debug!(index, "using single tool call arguments as json mode content");
                (Message::assistant(content), "stop".to_string())
            }
            None => {
                let finish_reason = choice.finish_reason_or_default();
                let role = choice.message.role_or_default();
                let raw_message = choice.message;
                let message = Message {
                    role,
                    content: raw_message.content,
                    function_call: raw_message
                        .function_call
                        .map(RawFunction::into_function_call),
                    tool_calls,
                    audio: raw_message.audio,
                };
                (message, finish_reason)
            }
        };

        Ok(Choice {
            index,
            finish_reason: map_finish_reason(&finish_reason),
            message,
            logprobs: choice.logprobs,
            enhancements: choice.enhancements,
        })
    }

    fn assemble_image(
        &self,
        payload: &RawPayload,
        target: Option<&ImageResponse>,
        options: &AssembleOptions,
    ) -> NormalizeResult<ImageResponse> {
        let raw: RawImage = decode_payload(payload, "image payload")?;

        let mut response = target.cloned().unwrap_or_default();
        if let Some(created) = raw.created {
            response.created = created.as_ref().and_then(unix_seconds);
        }
        if let Some(data) = raw.data {
            response.data = data;
        }
        response.hidden_params = self.hidden_params(options);

        Ok(response)
    }

    fn assemble_transcription(
        &self,
        payload: &RawPayload,
        target: Option<&TranscriptionResponse>,
        options: &AssembleOptions,
    ) -> NormalizeResult<TranscriptionResponse> {
        let raw: RawTranscription = decode_payload(payload, "transcription payload")?;

        let mut response = target.cloned().unwrap_or_default();
        if let Some(text) = raw.text {
            response.text = text;
        }
        // not guaranteed to be in the payload
        if let Some(language) = raw.language {
            response.language = language;
        }
        if let Some(task) = raw.task {
            response.task = task;
        }
        if let Some(duration) = raw.duration {
            response.duration = duration;
        }
        if let Some(words) = raw.words {
            response.words = words;
        }
        if let Some(segments) = raw.segments {
            response.segments = segments;
        }

        response.hidden_params = self.hidden_params(options);
        if let Some(headers) = &options.response_headers {
            response.response_headers = Some(headers.clone());
        }

        Ok(response)
    }

    /// Caller hidden params plus merged response headers
    fn hidden_params(&self, options: &AssembleOptions) -> HiddenParams {
        let mut hidden = options
            .hidden_params
            .clone()
            .map(HiddenParams::from_map)
            .unwrap_or_default();
        if let Some(headers) = &options.response_headers {
            hidden.additional_headers = Some(merge_response_headers(
                headers,
                &self.config.provider_header_prefix,
            ));
        }
        hidden
    }

    fn diagnostics(
        &self,
        payload: Option<&RawPayload>,
        kind: ResponseKind<'_>,
        options: &AssembleOptions,
    ) -> DiagnosticContext {
        let limit = self.config.max_diagnostic_keys;
        let key_count = payload.map_or(0, Map::len);
        let payload_keys: Vec<String> = payload
            .map(|p| p.keys().take(limit).cloned().collect())
            .unwrap_or_default();
        let backtrace = Backtrace::capture();

        DiagnosticContext {
            kind: kind.name(),
            stream: options.stream,
            payload_keys,
            omitted_keys: key_count.saturating_sub(limit),
            choice_count: payload
                .and_then(|p| p.get("choices"))
                .and_then(Value::as_array)
                .map(Vec::len),
            has_target: kind.has_target(),
            has_headers: options.response_headers.is_some(),
            backtrace: match backtrace.status() {
                BacktraceStatus::Captured => backtrace.to_string(),
                _ => String::new(),
            },
        }
    }
}

fn require_payload(payload: Option<&RawPayload>) -> NormalizeResult<&RawPayload> {
    payload.ok_or_else(|| NormalizeError::MalformedInput("response object is missing".to_string()))
}

/// Repaired calls when a packed call was expanded, the original list otherwise.
/// The flag tells which one was returned.
fn apply_repair(calls: Vec<ToolCall>) -> NormalizeResult<(Vec<ToolCall>, bool)> {
    let repaired = match repair_parallel_tool_calls(&calls)? {
        Cow::Owned(repaired) => Some(repaired),
        Cow::Borrowed(_) => None,
    };
    Ok(match repaired {
        Some(repaired) => (repaired, true),
        None => (calls, false),
    })
}
