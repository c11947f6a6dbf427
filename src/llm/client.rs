//! Core `TextGenerator` trait and the HTTP `ApiGenerator`.
//!
//! `ApiGenerator` speaks either the OpenAI-compatible `/v1/chat/completions`
//! protocol (OpenAI, Groq, Ollama in OpenAI mode, LM Studio, vLLM …) or
//! Gemini `generateContent`.  All connection details come from
//! [`LlmConfig`]; nothing is hardcoded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};
use crate::dataset::{ParseError, Violation};

use super::prompt::PromptPayload;

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

/// Coarse error category used by the run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport, timeout, rate limit or empty response.
    Api,
    Parse,
    Validation,
    Cancelled,
}

/// Everything that can go wrong while producing one record.
///
/// Every variant except `Cancelled` is retryable.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP transport, connection or non-success status.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The service answered 429 Too Many Requests.
    #[error("rate limited by the generation service")]
    RateLimited,

    /// The service returned no usable text.
    #[error("generation service returned an empty response")]
    EmptyResponse,

    /// The text could not be decoded into record fields.
    #[error("unusable response: {0}")]
    Parse(#[from] ParseError),

    /// The decoded record broke one or more invariants.
    #[error("record rejected: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    /// The run was interrupted while this sample was in flight.
    #[error("generation cancelled")]
    Cancelled,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Request(_)
            | GenerationError::Timeout
            | GenerationError::RateLimited
            | GenerationError::EmptyResponse => ErrorKind::Api,
            GenerationError::Parse(_) => ErrorKind::Parse,
            GenerationError::Validation(_) => ErrorKind::Validation,
            GenerationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Cancelled
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// One call to the generation service: the prompt plus model parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: PromptPayload,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: PromptPayload, config: &LlmConfig) -> Self {
        Self {
            prompt,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async black-box text completion.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TextGenerator>`.  Only API-kind errors are expected from
/// implementations; parsing and validation happen in the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// ApiGenerator
// ---------------------------------------------------------------------------

/// HTTP client for the configured provider.
pub struct ApiGenerator {
    client: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    api_key: Option<String>,
}

impl ApiGenerator {
    /// Build from config.  The HTTP client carries the per-request timeout
    /// from `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            log::warn!(
                "no API key configured (set llm.api_key or {})",
                config.provider.api_key_env()
            );
        }

        Self {
            client,
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        match self.provider {
            LlmProvider::OpenAiCompatible => format!("{}/v1/chat/completions", self.base_url),
            LlmProvider::Gemini => {
                format!("{}/v1beta/models/{model}:generateContent", self.base_url)
            }
        }
    }

    fn body(&self, request: &GenerationRequest) -> serde_json::Value {
        let prompt = &request.prompt;
        match self.provider {
            LlmProvider::OpenAiCompatible => serde_json::json!({
                "model":       request.model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user",   "content": prompt.user   }
                ],
                "stream":      false,
                "temperature": request.temperature,
                "max_tokens":  request.max_tokens
            }),
            LlmProvider::Gemini => serde_json::json!({
                "systemInstruction": { "parts": [{ "text": prompt.system }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": prompt.user }] }
                ],
                "generationConfig": {
                    "temperature":     request.temperature,
                    "maxOutputTokens": request.max_tokens
                }
            }),
        }
    }
}

/// Generated text from a provider response body.
fn extract_text(provider: LlmProvider, json: &serde_json::Value) -> Result<String, GenerationError> {
    let text = match provider {
        LlmProvider::OpenAiCompatible => json["choices"][0]["message"]["content"].as_str(),
        LlmProvider::Gemini => json["candidates"][0]["content"]["parts"][0]["text"].as_str(),
    }
    .ok_or(GenerationError::EmptyResponse)?
    .trim()
    .to_string();

    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for ApiGenerator {
    /// The API key is sent as a bearer token (OpenAI-compatible) or as the
    /// `x-goog-api-key` header (Gemini), and only when non-empty.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = self.endpoint(&request.model);
        let mut req = self.client.post(&url).json(&self.body(request));

        if let Some(key) = self.api_key.as_deref() {
            req = match self.provider {
                LlmProvider::OpenAiCompatible => req.bearer_auth(key),
                LlmProvider::Gemini => req.header("x-goog-api-key", key),
            };
        }

        let response = req.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(GenerationError::Request(format!("HTTP {status}: {snippet}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(format!("invalid response body: {e}")))?;

        extract_text(self.provider, &json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Difficulty;

    fn make_config(provider: LlmProvider, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            base_url: "http://localhost:11434/".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "qwen2.5:3b".into(),
            temperature: 0.7,
            max_tokens: 300,
            timeout_secs: 10,
        }
    }

    fn request() -> GenerationRequest {
        let prompt = PromptPayload {
            system: "sys".into(),
            examples: Vec::new(),
            scenario: "daily_standup".into(),
            domain: "software_development".into(),
            difficulty: Difficulty::Easy,
            user: "usr".into(),
        };
        GenerationRequest::new(prompt, &make_config(LlmProvider::OpenAiCompatible, None))
    }

    #[test]
    fn request_copies_model_parameters() {
        let r = request();
        assert_eq!(r.model, "qwen2.5:3b");
        assert_eq!(r.max_tokens, 300);
        assert!((r.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn openai_endpoint_and_body() {
        let g = ApiGenerator::from_config(&make_config(LlmProvider::OpenAiCompatible, Some("sk-test")));
        assert_eq!(g.endpoint("m"), "http://localhost:11434/v1/chat/completions");

        let body = g.body(&request());
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_tokens"], 300);
    }

    #[test]
    fn gemini_endpoint_and_body() {
        let g = ApiGenerator::from_config(&make_config(LlmProvider::Gemini, Some("key")));
        assert_eq!(
            g.endpoint("gemini-1.5-flash"),
            "http://localhost:11434/v1beta/models/gemini-1.5-flash:generateContent"
        );

        let body = g.body(&request());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "usr");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
    }

    #[test]
    fn text_is_extracted_per_provider() {
        let openai = serde_json::json!({"choices": [{"message": {"content": "  {\"a\": 1}  "}}]});
        assert_eq!(
            extract_text(LlmProvider::OpenAiCompatible, &openai).unwrap(),
            "{\"a\": 1}"
        );

        let gemini = serde_json::json!({"candidates": [{"content": {"parts": [{"text": "xin chào"}]}}]});
        assert_eq!(extract_text(LlmProvider::Gemini, &gemini).unwrap(), "xin chào");
    }

    #[test]
    fn missing_or_blank_text_is_empty_response() {
        let blank = serde_json::json!({"choices": [{"message": {"content": "   "}}]});
        assert!(matches!(
            extract_text(LlmProvider::OpenAiCompatible, &blank),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            extract_text(LlmProvider::Gemini, &serde_json::json!({})),
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[test]
    fn error_kinds() {
        assert_eq!(GenerationError::Timeout.kind(), ErrorKind::Api);
        assert_eq!(GenerationError::RateLimited.kind(), ErrorKind::Api);
        assert_eq!(GenerationError::from(ParseError::NoJsonObject).kind(), ErrorKind::Parse);
        assert_eq!(
            GenerationError::Validation(vec![Violation::HardWithoutPhrase]).kind(),
            ErrorKind::Validation
        );
        assert!(!GenerationError::Cancelled.is_retryable());
        assert!(GenerationError::EmptyResponse.is_retryable());
    }

    #[test]
    fn validation_error_lists_violations() {
        let e = GenerationError::Validation(vec![
            Violation::SpokenNotLowercase,
            Violation::LengthMismatch { en: 3, vi: 2 },
        ]);
        let msg = e.to_string();
        assert!(msg.contains("spoken is not lowercase"));
        assert!(msg.contains("3 entries"));
    }

    /// `ApiGenerator` must be usable as `dyn TextGenerator`.
    #[test]
    fn generator_is_object_safe() {
        let g: Box<dyn TextGenerator> =
            Box::new(ApiGenerator::from_config(&make_config(LlmProvider::OpenAiCompatible, None)));
        drop(g);
    }
}
