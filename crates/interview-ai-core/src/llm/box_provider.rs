//! BoxChatProvider -- object-safe dynamic dispatch wrapper for ChatProvider.
//!
//! 1. Define an object-safe `ChatProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ChatProviderDyn` for all `T: ChatProvider`
//! 3. `BoxChatProvider` wraps `Box<dyn ChatProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use secrecy::SecretString;

use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{ChatCompletion, ChatRequest, ProviderKind};

use super::provider::ChatProvider;

/// Object-safe version of [`ChatProvider`] with boxed futures.
pub trait ChatProviderDyn: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn default_model(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        api_key: &'a SecretString,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, ProviderError>> + Send + 'a>>;
}

impl<T: ChatProvider> ChatProviderDyn for T {
    fn kind(&self) -> ProviderKind {
        ChatProvider::kind(self)
    }

    fn default_model(&self) -> &str {
        ChatProvider::default_model(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        api_key: &'a SecretString,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, ProviderError>> + Send + 'a>> {
        Box::pin(self.complete(api_key, request))
    }
}

/// Type-erased chat provider.
///
/// Lets the router hold OpenRouter and OpenAI clients (or test doubles)
/// behind one concrete type.
pub struct BoxChatProvider {
    inner: Box<dyn ChatProviderDyn + Send + Sync>,
}

impl BoxChatProvider {
    pub fn new<T: ChatProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    pub fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    /// Send one completion request.
    pub async fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, ProviderError> {
        self.inner.complete_boxed(api_key, request).await
    }
}
