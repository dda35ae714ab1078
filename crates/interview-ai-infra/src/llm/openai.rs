//! OpenAiProvider -- the secondary, single-key direct backend.

use std::time::Duration;

use secrecy::SecretString;

use interview_ai_core::llm::provider::ChatProvider;
use interview_ai_types::config::OpenAiSettings;
use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{ChatCompletion, ChatRequest, ProviderKind};

use super::chat_completions::ChatCompletionsClient;

pub struct OpenAiProvider {
    inner: ChatCompletionsClient,
}

impl OpenAiProvider {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ProviderError> {
        let inner = ChatCompletionsClient::new(
            &settings.base_url,
            &settings.default_model,
            Duration::from_secs(settings.request_timeout_secs),
            Vec::new(),
        )?;
        Ok(Self { inner })
    }
}

impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

#[cfg(test)]
mod tests {
    use super::*;
    use interview_ai_types::llm::GenerationOptions;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_uses_configured_default_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"content": "fallback answer"}}],
                "usage": {"total_tokens": 31}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = OpenAiSettings {
            base_url: format!("{}/v1", server.uri()),
            ..OpenAiSettings::default()
        };
        let provider = OpenAiProvider::new(&settings).unwrap();

        let request = ChatRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "hi".to_string(),
            options: GenerationOptions::default(),
        };
        let completion = provider
            .complete(&SecretString::from("sk-openai".to_string()), &request)
            .await
            .unwrap();
        assert_eq!(completion.content, "fallback answer");
        assert_eq!(completion.total_tokens, Some(31));
        assert_eq!(provider.kind(), ProviderKind::OpenAi);
    }

    #[tokio::test]
    async fn test_server_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let settings = OpenAiSettings {
            base_url: server.uri(),
            ..OpenAiSettings::default()
        };
        let provider = OpenAiProvider::new(&settings).unwrap();
        let request = ChatRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "hi".to_string(),
            options: GenerationOptions::default(),
        };
        let err = provider
            .complete(&SecretString::from("sk-openai".to_string()), &request)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}
