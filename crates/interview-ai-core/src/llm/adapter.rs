//! Chat-model adapter over the failover router.
//!
//! Lets message-based pipelines call the router, which only understands a
//! flat (system prompt, user prompt) pair.

use std::sync::Arc;

use interview_ai_types::error::RouterError;
use interview_ai_types::llm::{
    GenerationMetadata, GenerationOptions, Message, MessageRole, DEFAULT_FEATURE_TYPE,
};

use super::router::FailoverRouter;
use crate::repository::usage::UsageLogStore;

/// Per-invocation metadata that takes precedence over the adapter's defaults.
#[derive(Debug, Clone, Default)]
pub struct CallOverrides {
    pub user_id: Option<String>,
    pub is_premium_user: Option<bool>,
    pub feature_type: Option<String>,
}

pub struct ChatModelAdapter<S> {
    router: Arc<FailoverRouter<S>>,
    user_id: Option<String>,
    is_premium_user: bool,
    feature_type: String,
    options: GenerationOptions,
}

impl<S: UsageLogStore> ChatModelAdapter<S> {
    /// An anonymous, non-premium adapter for the "general" feature.
    pub fn new(router: Arc<FailoverRouter<S>>) -> Self {
        Self {
            router,
            user_id: None,
            is_premium_user: false,
            feature_type: DEFAULT_FEATURE_TYPE.to_string(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, is_premium_user: bool) -> Self {
        self.user_id = Some(user_id.into());
        self.is_premium_user = is_premium_user;
        self
    }

    pub fn with_feature(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = feature_type.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Send `messages` through the router and wrap the text as an assistant turn.
    pub async fn invoke(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> Result<Message, RouterError> {
        let (system_prompt, user_prompt) = flatten_messages(messages);
        let metadata = self.metadata(system_prompt, overrides);

        let text = self
            .router
            .generate_text(&user_prompt, &metadata, &self.options)
            .await?;

        Ok(Message::assistant(text))
    }

    fn metadata(&self, system_prompt: String, overrides: Option<&CallOverrides>) -> GenerationMetadata {
        let overrides = overrides.cloned().unwrap_or_default();
        GenerationMetadata {
            user_id: overrides.user_id.or_else(|| self.user_id.clone()),
            is_premium_user: overrides.is_premium_user.unwrap_or(self.is_premium_user),
            feature_type: overrides
                .feature_type
                .unwrap_or_else(|| self.feature_type.clone()),
            system_prompt: (!system_prompt.is_empty()).then_some(system_prompt),
        }
    }
}

/// Split a conversation into `(system_prompt, user_prompt)`.
///
/// System turns and user turns are each newline-joined and trimmed.
/// Assistant turns are dropped.
pub fn flatten_messages(messages: &[Message]) -> (String, String) {
    let join = |role: MessageRole| {
        messages
            .iter()
            .filter(|m| m.role == role)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    };
    (join(MessageRole::System), join(MessageRole::User))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxChatProvider;
    use crate::llm::key_pool::KeyPool;
    use crate::llm::provider::ChatProvider;
    use crate::usage::ledger::UsageLedger;
    use crate::usage::memory::InMemoryUsageStore;
    use chrono::Utc;
    use interview_ai_types::config::{KeyPoolConfig, RouterConfig};
    use interview_ai_types::error::ProviderError;
    use interview_ai_types::llm::{ChatCompletion, ChatRequest, ProviderKind};
    use interview_ai_types::usage::ledger_date;
    use secrecy::SecretString;
    use std::future::Future;
    use std::sync::Mutex;

    /// Echoes the prompts it receives.
    struct EchoProvider {
        seen: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl ChatProvider for EchoProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenRouter
        }

        fn default_model(&self) -> &str {
            "echo"
        }

        fn complete(
            &self,
            _api_key: &SecretString,
            request: &ChatRequest,
        ) -> impl Future<Output = Result<ChatCompletion, ProviderError>> + Send {
            self.seen.lock().unwrap().push(request.clone());
            let content = format!("echo: {}", request.user_prompt);
            async move {
                Ok(ChatCompletion {
                    content,
                    model: "echo".to_string(),
                    total_tokens: None,
                })
            }
        }
    }

    fn adapter() -> (ChatModelAdapter<InMemoryUsageStore>, Arc<Mutex<Vec<ChatRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pool = Arc::new(KeyPool::new(
            vec![("OPENROUTER_API_KEY".to_string(), SecretString::from("key-1".to_string()))],
            KeyPoolConfig::default(),
        ));
        let router = FailoverRouter::new(
            pool,
            BoxChatProvider::new(EchoProvider { seen: Arc::clone(&seen) }),
            UsageLedger::new(InMemoryUsageStore::new(), 10),
            RouterConfig::default(),
        );
        (ChatModelAdapter::new(Arc::new(router)), seen)
    }

    #[test]
    fn test_flatten_joins_and_trims_by_role() {
        let messages = vec![
            Message::system("  You are an interviewer."),
            Message::user("Ask about Rust."),
            Message::assistant("Sure."),
            Message::system("Be concise.  "),
            Message::user("Then grade me.\n"),
        ];
        let (system, user) = flatten_messages(&messages);
        assert_eq!(system, "You are an interviewer.\nBe concise.");
        assert_eq!(user, "Ask about Rust.\nThen grade me.");
    }

    #[test]
    fn test_flatten_without_system_turns() {
        let (system, user) = flatten_messages(&[Message::user("hi")]);
        assert!(system.is_empty());
        assert_eq!(user, "hi");
    }

    #[tokio::test]
    async fn test_invoke_returns_assistant_message() {
        let (adapter, seen) = adapter();
        let reply = adapter
            .invoke(&[Message::system("Be brief."), Message::user("hello")], None)
            .await
            .unwrap();

        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "echo: hello");
        let request = seen.lock().unwrap()[0].clone();
        assert_eq!(request.system_prompt, "Be brief.");
    }

    #[tokio::test]
    async fn test_missing_system_turn_uses_default_prompt() {
        let (adapter, seen) = adapter();
        adapter.invoke(&[Message::user("hello")], None).await.unwrap();
        let request = seen.lock().unwrap()[0].clone();
        assert_eq!(request.system_prompt, interview_ai_types::llm::DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_overrides_take_precedence() {
        let (adapter, _) = adapter();
        let adapter = adapter.with_user("constructed", false).with_feature("qa_session");

        let overrides = CallOverrides {
            user_id: Some("override".to_string()),
            is_premium_user: Some(true),
            feature_type: None,
        };
        let metadata = adapter.metadata(String::new(), Some(&overrides));
        assert_eq!(metadata.user_id.as_deref(), Some("override"));
        assert!(metadata.is_premium_user);
        assert_eq!(metadata.feature_type, "qa_session");
        assert!(metadata.system_prompt.is_none());

        let defaults = adapter.metadata("sys".to_string(), None);
        assert_eq!(defaults.user_id.as_deref(), Some("constructed"));
        assert!(!defaults.is_premium_user);
        assert_eq!(defaults.system_prompt.as_deref(), Some("sys"));
    }

    #[tokio::test]
    async fn test_invoke_records_usage_for_override_user() {
        let (adapter, _) = adapter();
        let adapter = adapter.with_user("constructed", false);
        let overrides = CallOverrides {
            user_id: Some("override".to_string()),
            ..CallOverrides::default()
        };
        adapter
            .invoke(&[Message::user("hello")], Some(&overrides))
            .await
            .unwrap();

        let store = adapter.router.ledger().store();
        let today = ledger_date(Utc::now());
        assert!(store.find_entry("override", today).await.unwrap().is_some());
        assert!(store.find_entry("constructed", today).await.unwrap().is_none());
    }
}
