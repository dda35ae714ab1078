//! OpenRouterProvider -- the primary, multi-key aggregator backend.
//!
//! Adds the `HTTP-Referer` and `X-Title` attribution headers OpenRouter
//! uses to identify the calling application. Model names are
//! aggregator-qualified (e.g. "openai/gpt-4o-mini").

use std::time::Duration;

use secrecy::SecretString;

use interview_ai_core::llm::provider::ChatProvider;
use interview_ai_types::config::OpenRouterSettings;
use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{ChatCompletion, ChatRequest, ProviderKind};

use super::chat_completions::ChatCompletionsClient;

pub struct OpenRouterProvider {
    inner: ChatCompletionsClient,
}

impl OpenRouterProvider {
    pub fn new(settings: &OpenRouterSettings) -> Result<Self, ProviderError> {
        let headers = vec![
            ("HTTP-Referer", settings.referer.clone()),
            ("X-Title", settings.title.clone()),
        ];
        let inner = ChatCompletionsClient::new(
            &settings.base_url,
            &settings.default_model,
            Duration::from_secs(settings.request_timeout_secs),
            headers,
        )?;
        Ok(Self { inner })
    }
}

impl ChatProvider for OpenRouterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        self.inner.complete(api_key, request).await
    }
}
