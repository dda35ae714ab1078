//! Two-stage failover router.
//!
//! Stage 1 rotates through the primary provider's key pool for a bounded
//! number of attempts. Stage 2 makes a single call to the secondary
//! provider, gated by the caller's daily usage quota. Provider errors never
//! leave this module; callers only see [`RouterError`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use interview_ai_types::config::RouterConfig;
use interview_ai_types::error::{KeyPoolError, RouterError};
use interview_ai_types::llm::{
    ChatCompletion, ChatRequest, GenerationMetadata, GenerationOptions, ProviderKind, SystemStatus,
};
use interview_ai_types::usage::{CallOutcome, UsageRecord};

use super::box_provider::BoxChatProvider;
use super::key_pool::KeyPool;
use crate::repository::usage::UsageLogStore;
use crate::usage::ledger::UsageLedger;

/// The quota-gated fallback backend and its single key.
struct SecondaryProvider {
    provider: BoxChatProvider,
    api_key: SecretString,
}

/// Routes generation requests across the primary key pool and the
/// secondary provider.
///
/// Shared behind `Arc` by every request handler; all methods take `&self`.
pub struct FailoverRouter<S> {
    key_pool: Arc<KeyPool>,
    primary: BoxChatProvider,
    secondary: Option<SecondaryProvider>,
    ledger: UsageLedger<S>,
    config: RouterConfig,
}

impl<S: UsageLogStore> FailoverRouter<S> {
    /// A router with no secondary provider. Callers who exhaust the primary
    /// get `QuotaExceeded` if ineligible and `Unavailable` otherwise.
    pub fn new(
        key_pool: Arc<KeyPool>,
        primary: BoxChatProvider,
        ledger: UsageLedger<S>,
        config: RouterConfig,
    ) -> Self {
        Self {
            key_pool,
            primary,
            secondary: None,
            ledger,
            config,
        }
    }

    /// Attach the secondary provider and its key.
    pub fn with_secondary(mut self, provider: BoxChatProvider, api_key: SecretString) -> Self {
        self.secondary = Some(SecondaryProvider { provider, api_key });
        self
    }

    pub fn key_pool(&self) -> &Arc<KeyPool> {
        &self.key_pool
    }

    pub fn ledger(&self) -> &UsageLedger<S> {
        &self.ledger
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn secondary_configured(&self) -> bool {
        self.secondary.is_some()
    }

    /// Generate text for `prompt`.
    pub async fn generate_text(
        &self,
        prompt: &str,
        metadata: &GenerationMetadata,
        options: &GenerationOptions,
    ) -> Result<String, RouterError> {
        self.generate_text_with_cancel(prompt, metadata, options, &CancellationToken::new())
            .await
    }

    /// [`generate_text`](Self::generate_text) that stops as soon as `cancel`
    /// fires, returning `RouterError::Cancelled`.
    ///
    /// When `overall_timeout_secs` is configured, the whole two-stage
    /// sequence is bounded by it and expiry yields `RouterError::Unavailable`.
    pub async fn generate_text_with_cancel(
        &self,
        prompt: &str,
        metadata: &GenerationMetadata,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<String, RouterError> {
        let span = tracing::info_span!(
            "generate_text",
            feature = %metadata.feature_type,
            premium = metadata.is_premium_user,
        );

        let bounded = async {
            let stages = self.run_stages(prompt, metadata, options);
            match self.config.overall_timeout_secs {
                Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), stages).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(timeout_secs = secs, "Generation deadline exceeded");
                        Err(RouterError::Unavailable)
                    }
                },
                None => stages.await,
            }
        };

        async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Generation cancelled by caller");
                    Err(RouterError::Cancelled)
                }
                result = bounded => result,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        prompt: &str,
        metadata: &GenerationMetadata,
        options: &GenerationOptions,
    ) -> Result<String, RouterError> {
        let request = ChatRequest {
            system_prompt: metadata.system_prompt_or_default().to_string(),
            user_prompt: prompt.to_string(),
            options: options.clone(),
        };

        if let Some(completion) = self.try_primary(&request).await {
            self.record_success(metadata, self.primary.kind(), &completion)
                .await;
            return Ok(completion.content);
        }

        self.try_secondary(request, metadata).await
    }

    /// Stage 1. Returns `None` once the attempt budget or the pool is exhausted.
    async fn try_primary(&self, request: &ChatRequest) -> Option<ChatCompletion> {
        let max_attempts = self.config.max_primary_attempts;
        let mut attempts = 0;

        while attempts < max_attempts {
            let Some(selected) = self.key_pool.select_key() else {
                tracing::warn!(attempts, "No usable primary key, leaving stage 1");
                return None;
            };

            match self.primary.complete(&selected.key, request).await {
                Ok(completion) => {
                    tracing::debug!(
                        slot = %selected.slot,
                        key_suffix = %selected.masked(),
                        model = %completion.model,
                        "Primary provider call succeeded"
                    );
                    return Some(completion);
                }
                Err(err) => {
                    attempts += 1;
                    tracing::warn!(
                        attempt = attempts,
                        max_attempts,
                        slot = %selected.slot,
                        key_suffix = %selected.masked(),
                        error = %err,
                        "Primary provider call failed"
                    );
                    self.key_pool
                        .report_failure(selected.key.expose_secret(), &err);
                }
            }
        }

        tracing::warn!(max_attempts, "Primary attempt budget exhausted");
        None
    }

    /// Stage 2. A single attempt, never retried.
    async fn try_secondary(
        &self,
        mut request: ChatRequest,
        metadata: &GenerationMetadata,
    ) -> Result<String, RouterError> {
        let user_id = metadata.user_id.as_deref();

        if !self
            .ledger
            .can_use_secondary_provider(user_id, metadata.is_premium_user)
            .await
        {
            tracing::info!(user_id = user_id.unwrap_or("anonymous"), "Secondary provider not permitted");
            return Err(RouterError::QuotaExceeded);
        }

        let Some(secondary) = &self.secondary else {
            tracing::error!("Secondary provider eligible but not configured");
            return Err(RouterError::Unavailable);
        };

        // Primary model names are aggregator-qualified; the secondary uses its own default.
        request.options.model = None;

        tracing::info!(
            provider = %secondary.provider.kind(),
            user_id = user_id.unwrap_or("anonymous"),
            "Failing over to secondary provider"
        );

        match secondary.provider.complete(&secondary.api_key, &request).await {
            Ok(completion) => {
                self.record_success(metadata, secondary.provider.kind(), &completion)
                    .await;
                Ok(completion.content)
            }
            Err(err) => {
                tracing::error!(
                    provider = %secondary.provider.kind(),
                    error = %err,
                    "Secondary provider call failed"
                );
                Err(RouterError::Unavailable)
            }
        }
    }

    async fn record_success(
        &self,
        metadata: &GenerationMetadata,
        provider: ProviderKind,
        completion: &ChatCompletion,
    ) {
        let record = UsageRecord {
            provider,
            model: completion.model.clone(),
            status: CallOutcome::Success,
            tokens: completion.total_tokens,
            timestamp: Utc::now(),
            request_type: metadata.feature_type.clone(),
            details: None,
        };
        self.ledger.record(metadata.user_id.as_deref(), record).await;
    }

    /// Pool snapshot plus routing settings. Contains full key secrets;
    /// redact before exposing to non-owners.
    pub fn system_status(&self) -> SystemStatus {
        SystemStatus {
            primary: self.key_pool.status(),
            secondary_configured: self.secondary.is_some(),
            daily_secondary_limit: self.ledger.daily_limit(),
            max_primary_attempts: self.config.max_primary_attempts,
        }
    }

    /// Manually lock a primary key by slot name.
    pub fn lock_key(&self, slot: &str) -> Result<(), KeyPoolError> {
        found(self.key_pool.force_disable(slot), slot)
    }

    /// Unlock a primary key and clear its cooldown.
    pub fn unlock_key(&self, slot: &str) -> Result<(), KeyPoolError> {
        found(self.key_pool.enable(slot), slot)
    }

    /// Clear a primary key's cooldown, keeping any manual lock.
    pub fn reset_key(&self, slot: &str) -> Result<(), KeyPoolError> {
        found(self.key_pool.reset_key(slot), slot)
    }
}

fn found(matched: bool, identifier: &str) -> Result<(), KeyPoolError> {
    if matched {
        Ok(())
    } else {
        Err(KeyPoolError::KeyNotFound {
            identifier: identifier.to_string(),
        })
    }
}
