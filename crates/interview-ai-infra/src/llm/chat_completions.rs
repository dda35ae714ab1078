//! Shared client for the OpenAI-style `/chat/completions` endpoint.
//!
//! Both backends speak the same protocol; they differ only in base URL,
//! default model and extra headers. Each call is a single non-streaming
//! POST with bearer auth. Retries belong to the router.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{ChatCompletion, ChatRequest};

/// Longest error body kept in a [`ProviderError::Http`].
const MAX_ERROR_BODY: usize = 2048;

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionsRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<&'a serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionsResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// HTTP plumbing shared by the OpenRouter and OpenAI providers.
///
/// Holds no API key; the caller passes one per request.
pub(crate) struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    extra_headers: Vec<(&'static str, String)>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        default_model: &str,
        timeout: Duration,
        extra_headers: Vec<(&'static str, String)>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            extra_headers,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionsRequest<'a> {
        ChatCompletionsRequest {
            model: request
                .options
                .model
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(&self.default_model),
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.options.temperature_or_default(),
            max_tokens: request.options.max_tokens_or_default(),
            response_format: request.options.response_format.as_ref(),
        }
    }

    pub async fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        let body = self.to_wire(request);
        let requested_model = body.model.to_string();

        let mut builder = self
            .client
            .post(self.url())
            .bearer_auth(api_key.expose_secret())
            .json(&body);
        for (name, value) in &self.extra_headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut error_body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut error_body, MAX_ERROR_BODY);
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let parsed: ChatCompletionsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Deserialization(format!("failed to parse response: {e}"))
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(ChatCompletion {
            content,
            model: parsed.model.unwrap_or(requested_model),
            total_tokens: parsed.usage.and_then(|u| u.total_tokens),
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(e.to_string())
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
