//! ChatProvider trait definition.
//!
//! The single abstraction both chat-completion backends implement. Uses
//! RPITIT for `complete`; see `BoxChatProvider` for dynamic dispatch.

use secrecy::SecretString;

use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{ChatCompletion, ChatRequest, ProviderKind};

/// A chat-completion backend (OpenRouter, OpenAI).
///
/// The API key is passed per call rather than held by the provider so the
/// primary backend can rotate through the key pool.
///
/// Implementations live in interview-ai-infra.
pub trait ChatProvider: Send + Sync {
    /// Which backend this is. Drives usage-ledger counters.
    fn kind(&self) -> ProviderKind;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;

    /// Send one non-streaming completion request.
    ///
    /// Exactly one request is issued per call; retries are the router's job.
    fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatCompletion, ProviderError>> + Send;
}
