//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends non-streaming requests to `generateContent`. When the request
//! carries an output schema, JSON output is requested through
//! `responseMimeType` and `responseJsonSchema`.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use viper_core::llm::provider::LlmProvider;
use viper_observe::genai_attrs::{
    GEN_AI_OPERATION_NAME, GEN_AI_OUTPUT_TYPE, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MAX_TOKENS,
    GEN_AI_REQUEST_MODEL, GEN_AI_REQUEST_TEMPERATURE, GEN_AI_RESPONSE_FINISH_REASONS,
    GEN_AI_RESPONSE_ID, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
    OP_GENERATE_CONTENT, PROVIDER_GEMINI,
};
use viper_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GeminiGenerationConfig, GeminiRequest, GeminiResponse,
};

/// Default Gemini API origin.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini LLM provider.
///
/// Does not derive `Debug`; the key never leaves the header builder.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for `model`.
    ///
    /// The HTTP client timeout is a transport backstop; generation deadlines
    /// are enforced by the caller's policy.
    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into a [`GeminiRequest`].
    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                GeminiContent::text(Some(role), m.content.clone())
            })
            .collect();

        let schema = request.output_schema.as_ref();

        GeminiRequest {
            system_instruction: request
                .system
                .as_ref()
                .map(|s| GeminiContent::text(None, s.clone())),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: schema.map(|_| "application/json".to_string()),
                response_json_schema: schema.map(|s| s.schema.clone()),
            },
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let body = self.to_gemini_request(request);

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), retry_after_secs, &error_body));
        }

        let gemini_resp: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        into_completion(gemini_resp, model)
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(crate) fn map_status(status: u16, retry_after_secs: Option<u64>, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        400 => LlmError::InvalidRequest(message),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after_secs.map(|s| s.saturating_mul(1000)),
        },
        500 | 503 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Extract the answer text, stop reason and usage from a Gemini response.
pub(crate) fn into_completion(
    response: GeminiResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::InvalidRequest(format!("prompt blocked: {reason}")));
        }
        return Err(LlmError::EmptyResponse);
    };

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| p.thought != Some(true))
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let stop_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            StopReason::Safety
        }
        Some(_) => StopReason::Other,
    };

    if content.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let usage = response.usage_metadata.unwrap_or_default();

    Ok(CompletionResponse {
        id: response.response_id.unwrap_or_default(),
        content,
        model: response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        stop_reason,
        usage: Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let output_type = if request.output_schema.is_some() {
            "json"
        } else {
            "text"
        };
        let span = tracing::info_span!(
            "gen_ai.complete",
            otel.name = %format!("{} {}", OP_GENERATE_CONTENT, request.model),
            { GEN_AI_OPERATION_NAME } = OP_GENERATE_CONTENT,
            { GEN_AI_PROVIDER_NAME } = PROVIDER_GEMINI,
            { GEN_AI_REQUEST_MODEL } = %request.model,
            { GEN_AI_REQUEST_MAX_TOKENS } = request.max_tokens,
            { GEN_AI_REQUEST_TEMPERATURE } = ?request.temperature,
            { GEN_AI_OUTPUT_TYPE } = output_type,
            { GEN_AI_RESPONSE_ID } = tracing::field::Empty,
            { GEN_AI_RESPONSE_FINISH_REASONS } = tracing::field::Empty,
            { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
            { GEN_AI_USAGE_OUTPUT_TOKENS } = tracing::field::Empty,
        );

        let result = self.send(request).instrument(span.clone()).await;

        match &result {
            Ok(response) => {
                span.record(GEN_AI_RESPONSE_ID, response.id.as_str());
                span.record(
                    GEN_AI_RESPONSE_FINISH_REASONS,
                    response.stop_reason.to_string().as_str(),
                );
                span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
                span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
            }
            Err(e) => {
                span.in_scope(|| tracing::debug!("gemini request failed: {e}"));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viper_types::llm::{Message, OutputSchema};

    fn make_provider() -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from("test-key-not-real"),
            "gemini-3-flash-preview".to_string(),
        )
        .unwrap()
    }

    fn request(schema: bool) -> CompletionRequest {
        CompletionRequest {
            model: "gemini-3-flash-preview".to_string(),
            messages: vec![Message {
                role: MessageRole::User,
                content: "a moderation bot".to_string(),
            }],
            system: Some("You are Viper AI.".to_string()),
            max_tokens: 2048,
            temperature: Some(0.7),
            output_schema: schema.then(|| OutputSchema {
                name: "BotSpecification".to_string(),
                schema: serde_json::json!({"type": "object"}),
            }),
        }
    }

    #[test]
    fn test_provider_name_and_url() {
        let provider = make_provider().with_base_url("http://localhost:9999/".to_string());
        assert_eq!(provider.name(), "gemini");
        assert_eq!(
            provider.url("gemini-3-flash-preview"),
            "http://localhost:9999/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_to_gemini_request_with_schema() {
        let provider = make_provider();
        let body = serde_json::to_value(provider.to_gemini_request(&request(true))).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Viper AI.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a moderation bot");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseJsonSchema"]["type"], "object");
    }

    #[test]
    fn test_to_gemini_request_plain_text() {
        let provider = make_provider();
        let mut req = request(false);
        req.messages.push(Message {
            role: MessageRole::Assistant,
            content: "ok".to_string(),
        });
        let body = serde_json::to_value(provider.to_gemini_request(&req)).unwrap();

        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("responseJsonSchema").is_none());
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn test_map_status() {
        let body = r#"{"error":{"code":400,"message":"bad schema","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            map_status(400, None, body),
            LlmError::InvalidRequest(m) if m == "bad schema"
        ));
        assert!(matches!(map_status(403, None, ""), LlmError::AuthenticationFailed));
        assert!(matches!(
            map_status(429, Some(7), ""),
            LlmError::RateLimited { retry_after_ms: Some(7000) }
        ));
        assert!(matches!(map_status(503, None, "busy"), LlmError::Overloaded(_)));
        assert!(matches!(map_status(418, None, "teapot"), LlmError::Provider { .. }));
    }

    #[test]
    fn test_into_completion_joins_text_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "{\"botName\":"},
                    {"text": "\"ModGuard\"}"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34},
            "modelVersion": "gemini-3-flash-preview",
            "responseId": "resp-1"
        }))
        .unwrap();

        let completion = into_completion(response, "gemini-3-flash-preview").unwrap();
        assert_eq!(completion.content, r#"{"botName":"ModGuard"}"#);
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.input_tokens, 12);
        assert_eq!(completion.usage.output_tokens, 34);
        assert_eq!(completion.id, "resp-1");
    }

    #[test]
    fn test_into_completion_empty_and_blocked() {
        let empty: GeminiResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            into_completion(empty, "m"),
            Err(LlmError::EmptyResponse)
        ));

        let blocked: GeminiResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(
            into_completion(blocked, "m"),
            Err(LlmError::InvalidRequest(_))
        ));

        let no_text: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(matches!(
            into_completion(no_text, "m"),
            Err(LlmError::EmptyResponse)
        ));
    }
}
