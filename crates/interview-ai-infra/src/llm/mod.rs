//! Chat-completion provider implementations.
//!
//! Concrete [`ChatProvider`](interview_ai_core::llm::provider::ChatProvider)
//! implementations for OpenRouter (primary) and OpenAI (secondary), plus
//! [`build_router`], which wires them together with a key pool and usage
//! ledger from an [`AiConfig`].

mod chat_completions;
pub mod openai;
pub mod openrouter;

use std::sync::Arc;

use secrecy::SecretString;

use interview_ai_core::llm::box_provider::BoxChatProvider;
use interview_ai_core::llm::key_pool::KeyPool;
use interview_ai_core::llm::router::FailoverRouter;
use interview_ai_core::repository::usage::UsageLogStore;
use interview_ai_core::usage::ledger::UsageLedger;
use interview_ai_types::config::{AiConfig, OpenAiSettings, OpenRouterSettings};
use interview_ai_types::error::ProviderError;

use self::openai::OpenAiProvider;
use self::openrouter::OpenRouterProvider;

pub fn create_primary_provider(settings: &OpenRouterSettings) -> Result<BoxChatProvider, ProviderError> {
    Ok(BoxChatProvider::new(OpenRouterProvider::new(settings)?))
}

pub fn create_secondary_provider(settings: &OpenAiSettings) -> Result<BoxChatProvider, ProviderError> {
    Ok(BoxChatProvider::new(OpenAiProvider::new(settings)?))
}

/// Assemble a [`FailoverRouter`] from configuration and resolved keys.
///
/// The secondary provider is attached only when `secondary_key` is present.
pub fn build_router<S: UsageLogStore>(
    config: &AiConfig,
    store: S,
    primary_keys: Vec<(String, SecretString)>,
    secondary_key: Option<SecretString>,
) -> Result<FailoverRouter<S>, ProviderError> {
    let key_pool = Arc::new(KeyPool::new(primary_keys, config.key_pool.clone()));
    let ledger = UsageLedger::new(store, config.router.daily_secondary_limit);
    let primary = create_primary_provider(&config.openrouter)?;

    let router = FailoverRouter::new(key_pool, primary, ledger, config.router.clone());

    match secondary_key {
        Some(key) => {
            let secondary = create_secondary_provider(&config.openai)?;
            Ok(router.with_secondary(secondary, key))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; secondary provider disabled");
            Ok(router)
        }
    }
}
