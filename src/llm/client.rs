//! Tone analysis client for OpenAI-compatible chat-completion endpoints.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{ToneAnalysisResult, ToneLabel};

use super::prompt::{analysis_prompt, system_prompt};
use super::protocol::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope, RawToneResult,
    ResponseFormat,
};
use super::PromptLocale;

/// Errors that can occur during a tone analysis call.
///
/// Every failure is surfaced to the caller of [`ToneClient::analyze`]; there
/// is no automatic retry.
#[derive(Debug, Clone, Error)]
pub enum ToneServiceError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("invalid API URL")]
    InvalidUrl,

    #[error("server response was not understood")]
    InvalidResponse,

    #[error("HTTP error (status {status})")]
    Http { status: u16 },

    /// Structured error reported by the upstream service.
    #[error("upstream error{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Upstream {
        message: String,
        code: Option<String>,
    },

    #[error("response contained no choices")]
    EmptyResponse,

    #[error("failed to parse analysis result")]
    ParsingFailed,

    #[error("invalid analysis result: {0}")]
    InvalidResult(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Configuration for the tone analysis client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneClientConfig {
    /// API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token for the hosted endpoint.
    #[serde(default)]
    pub api_key: String,
    /// Model used for analysis; also recorded on persisted records.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Locale of the prompt text sent to the model.
    #[serde(default)]
    pub locale: PromptLocale,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ToneClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            locale: PromptLocale::default(),
        }
    }
}

impl ToneClientConfig {
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Cheap shape check for an OpenAI-style key.
    pub fn api_key_looks_valid(&self) -> bool {
        self.api_key.starts_with("sk-") && self.api_key.len() > 20
    }
}

/// Client for the hosted tone analysis endpoint.
pub struct ToneClient {
    config: ToneClientConfig,
    client: Client,
}

impl ToneClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ToneClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Get the config.
    pub fn config(&self) -> &ToneClientConfig {
        &self.config
    }

    /// Analyze the emotional tone of the given conversation text.
    ///
    /// Sends a single request with a bounded timeout. Non-2xx responses are
    /// decoded as a structured upstream error when possible, otherwise
    /// reported as a bare status-code error.
    pub async fn analyze(&self, text: &str) -> Result<ToneAnalysisResult, ToneServiceError> {
        if text.is_empty() {
            return Err(ToneServiceError::EmptyInput);
        }

        let url = self.completion_url()?;
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(self.config.locale).to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: analysis_prompt(self.config.locale, text),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(model = %self.config.model, chars = text.len(), "requesting tone analysis");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ToneServiceError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ToneServiceError::Network(e.to_string()))?;

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(&body) {
                return Err(ToneServiceError::Upstream {
                    message: envelope.error.message,
                    code: envelope.error.code,
                });
            }
            return Err(ToneServiceError::Http {
                status: status.as_u16(),
            });
        }

        let chat: ChatCompletionResponse =
            serde_json::from_slice(&body).map_err(|_| ToneServiceError::InvalidResponse)?;

        let content = chat
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(ToneServiceError::EmptyResponse)?;

        parse_analysis_result(content)
    }

    fn completion_url(&self) -> Result<Url, ToneServiceError> {
        let raw = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        Url::parse(&raw).map_err(|_| ToneServiceError::InvalidUrl)
    }
}

/// Parse and validate the inner JSON result from the message content.
fn parse_analysis_result(content: &str) -> Result<ToneAnalysisResult, ToneServiceError> {
    let raw: RawToneResult =
        serde_json::from_str(content).map_err(|_| ToneServiceError::ParsingFailed)?;

    if !(0.0..=100.0).contains(&raw.tone_score) {
        return Err(ToneServiceError::InvalidResult(format!(
            "toneScore {} is outside 0..=100",
            raw.tone_score
        )));
    }

    let tone_label = ToneLabel::from_str(&raw.tone_label).ok_or_else(|| {
        ToneServiceError::InvalidResult(format!("unrecognized toneLabel {:?}", raw.tone_label))
    })?;

    Ok(ToneAnalysisResult {
        tone_score: raw.tone_score,
        tone_label,
        tone_keywords: raw.tone_keywords,
        reasoning: raw.reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_result() {
        let content = r#"{
            "toneScore": 85,
            "toneLabel": "Positive",
            "toneKeywords": ["joy", "warmth", "gratitude"],
            "reasoning": "friendly exchange"
        }"#;
        let result = parse_analysis_result(content).unwrap();
        assert_eq!(result.tone_score, 85.0);
        assert_eq!(result.tone_label, ToneLabel::Positive);
        assert_eq!(result.tone_keywords, vec!["joy", "warmth", "gratitude"]);
        assert_eq!(result.reasoning.as_deref(), Some("friendly exchange"));
    }

    #[test]
    fn test_reasoning_is_optional() {
        let content =
            r#"{"toneScore": 50, "toneLabel": "Neutral", "toneKeywords": ["calm", "plain", "ok"]}"#;
        let result = parse_analysis_result(content).unwrap();
        assert!(result.reasoning.is_none());
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let content =
            r#"{"toneScore": 150, "toneLabel": "Positive", "toneKeywords": ["joy", "a", "b"]}"#;
        let err = parse_analysis_result(content).unwrap_err();
        assert!(matches!(err, ToneServiceError::InvalidResult(_)));

        let content =
            r#"{"toneScore": -1, "toneLabel": "Negative", "toneKeywords": ["sad", "a", "b"]}"#;
        assert!(matches!(
            parse_analysis_result(content).unwrap_err(),
            ToneServiceError::InvalidResult(_)
        ));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let content =
            r#"{"toneScore": 60, "toneLabel": "Happy", "toneKeywords": ["joy", "a", "b"]}"#;
        let err = parse_analysis_result(content).unwrap_err();
        assert!(matches!(err, ToneServiceError::InvalidResult(_)));
    }

    #[test]
    fn test_malformed_content_is_parsing_failure() {
        assert!(matches!(
            parse_analysis_result("not json").unwrap_err(),
            ToneServiceError::ParsingFailed
        ));
        assert!(matches!(
            parse_analysis_result(r#"{"toneScore": "high"}"#).unwrap_err(),
            ToneServiceError::ParsingFailed
        ));
    }

    #[test]
    fn test_request_wire_field_names() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "system",
                content: "instructions".to_string(),
            }],
            temperature: 0.3,
            max_tokens: 500,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_success_envelope_decodes() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1736000000,
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "{}"},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content, "{}");
    }

    #[test]
    fn test_error_envelope_decodes() {
        let body = r#"{"error": {"message": "quota exceeded", "type": "insufficient_quota", "code": "insufficient_quota"}}"#;
        let parsed: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "quota exceeded");
        assert_eq!(parsed.error.code.as_deref(), Some("insufficient_quota"));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_network() {
        let client = ToneClient::new(ToneClientConfig::default());
        let err = client.analyze("").await.unwrap_err();
        assert!(matches!(err, ToneServiceError::EmptyInput));
    }

    #[test]
    fn test_default_config() {
        let config = ToneClientConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.api_key_looks_valid());
        assert!(config
            .clone()
            .with_api_key("sk-0123456789012345678901")
            .api_key_looks_valid());
    }

    #[test]
    fn test_invalid_endpoint_yields_invalid_url() {
        let client = ToneClient::new(ToneClientConfig::default().with_endpoint("not a url"));
        assert!(matches!(
            client.completion_url().unwrap_err(),
            ToneServiceError::InvalidUrl
        ));
    }
}
