//! Primary-provider API key pool.
//!
//! Holds every configured OpenRouter key with its rotation state and hands
//! keys out round-robin, skipping keys that are manually locked or cooling
//! down after a quota error. These types live in core (not infra) because
//! `FailoverRouter` depends on them.
//!
//! State is process-local and resets on restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use interview_ai_types::config::KeyPoolConfig;
use interview_ai_types::error::ProviderError;
use interview_ai_types::llm::{KeyPoolStatus, KeyStatus};

/// Rotation state for one configured key.
struct ApiKeyRecord {
    slot: String,
    key: SecretString,
    failure_count: u32,
    disabled_until: Option<DateTime<Utc>>,
    manually_disabled: bool,
    usage_count: u64,
}

impl ApiKeyRecord {
    fn new(slot: String, key: SecretString) -> Self {
        Self {
            slot,
            key,
            failure_count: 0,
            disabled_until: None,
            manually_disabled: false,
            usage_count: 0,
        }
    }

    fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        !self.manually_disabled && self.disabled_until.is_none_or(|until| until <= now)
    }

    fn holds(&self, key: &str) -> bool {
        self.key.expose_secret() == key
    }

    fn masked(&self) -> String {
        mask_key(self.key.expose_secret())
    }

    fn to_status(&self, now: DateTime<Utc>) -> KeyStatus {
        KeyStatus {
            slot: self.slot.clone(),
            masked_key: self.masked(),
            full_key: Some(self.key.expose_secret().to_string()),
            failure_count: self.failure_count,
            usage_count: self.usage_count,
            disabled_until: self.disabled_until,
            manually_disabled: self.manually_disabled,
            available: self.is_available_at(now),
        }
    }
}

/// Masked identifier showing only the last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("...{suffix}")
}

/// A key handed out by [`KeyPool::select_key`].
pub struct SelectedKey {
    pub slot: String,
    pub key: SecretString,
}

impl SelectedKey {
    pub fn masked(&self) -> String {
        mask_key(self.key.expose_secret())
    }
}

impl std::fmt::Debug for SelectedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedKey")
            .field("slot", &self.slot)
            .field("key", &self.masked())
            .finish()
    }
}

struct PoolState {
    records: Vec<ApiKeyRecord>,
    cursor: usize,
}

/// Round-robin pool of primary-provider keys.
///
/// All methods take `&self`; the state sits behind a mutex that is never
/// held across an `.await`.
pub struct KeyPool {
    state: Mutex<PoolState>,
    config: KeyPoolConfig,
}

impl KeyPool {
    /// Build a pool from `(slot, key)` pairs.
    ///
    /// Blank keys are skipped and a key value seen in an earlier slot is
    /// not added twice.
    pub fn new(keys: Vec<(String, SecretString)>, config: KeyPoolConfig) -> Self {
        let mut records: Vec<ApiKeyRecord> = Vec::with_capacity(keys.len());
        for (slot, key) in keys {
            let value = key.expose_secret().trim();
            if value.is_empty() {
                continue;
            }
            if records.iter().any(|r| r.key.expose_secret() == value) {
                tracing::debug!(%slot, "Duplicate key value, skipping slot");
                continue;
            }
            records.push(ApiKeyRecord::new(slot, SecretString::from(value.to_string())));
        }

        tracing::info!(keys = records.len(), "Key pool initialized");

        Self {
            state: Mutex::new(PoolState { records, cursor: 0 }),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &KeyPoolConfig {
        &self.config
    }

    /// Select the next usable key, advancing the shared cursor.
    pub fn select_key(&self) -> Option<SelectedKey> {
        self.select_key_at(Utc::now())
    }

    /// [`select_key`](Self::select_key) with an explicit clock.
    ///
    /// Visits each pool member at most once starting from the cursor.
    /// The cursor keeps its position between calls.
    pub fn select_key_at(&self, now: DateTime<Utc>) -> Option<SelectedKey> {
        let mut state = self.state();
        let len = state.records.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let idx = state.cursor % len;
            state.cursor = (idx + 1) % len;

            let record = &mut state.records[idx];
            if !record.is_available_at(now) {
                continue;
            }

            // Cooldown elapsed; forget the stale expiry.
            if record.disabled_until.is_some() {
                tracing::info!(slot = %record.slot, key = %record.masked(), "Key cooldown expired");
                record.disabled_until = None;
            }
            record.usage_count += 1;

            return Some(SelectedKey {
                slot: record.slot.clone(),
                key: record.key.clone(),
            });
        }

        tracing::warn!(keys = len, "No usable key in pool");
        None
    }

    /// Record a failed call made with `key` (the secret handed out by
    /// [`select_key`](Self::select_key)).
    pub fn report_failure(&self, key: &str, error: &ProviderError) {
        self.report_failure_at(key, error, Utc::now());
    }

    /// [`report_failure`](Self::report_failure) with an explicit clock.
    ///
    /// A failure counts as a quota error when it carries HTTP 429, when the
    /// key reaches the failure threshold, or when its message contains one
    /// of the configured quota markers. Quota errors start a cooldown and
    /// reset the failure count.
    pub fn report_failure_at(&self, key: &str, error: &ProviderError, now: DateTime<Utc>) {
        let mut state = self.state();
        let Some(record) = state.records.iter_mut().find(|r| r.holds(key)) else {
            tracing::warn!(key = %mask_key(key), "Failure reported for unknown key");
            return;
        };

        record.failure_count += 1;

        if self.is_quota_error(record.failure_count, error) {
            let until = now + Duration::seconds(self.config.cooldown_secs as i64);
            record.disabled_until = Some(until);
            record.failure_count = 0;
            tracing::warn!(
                slot = %record.slot,
                key = %record.masked(),
                until = %until.to_rfc3339(),
                error = %error,
                "Key disabled after quota/rate-limit error"
            );
        } else {
            tracing::debug!(
                slot = %record.slot,
                key = %record.masked(),
                failures = record.failure_count,
                error = %error,
                "Key failure recorded"
            );
        }
    }

    fn is_quota_error(&self, failure_count: u32, error: &ProviderError) -> bool {
        if error.is_rate_limited() {
            return true;
        }
        if self.config.failure_threshold > 0 && failure_count >= self.config.failure_threshold {
            return true;
        }
        let message = error.to_string().to_lowercase();
        self.config
            .quota_markers
            .iter()
            .any(|marker| message.contains(&marker.to_lowercase()))
    }

    /// Masked key behind a slot name.
    ///
    /// Control actions address keys by slot only; key values never travel
    /// through request paths or logs.
    pub fn resolve(&self, slot: &str) -> Option<String> {
        self.state()
            .records
            .iter()
            .find(|r| r.slot == slot)
            .map(|r| r.masked())
    }

    /// Manually lock the key in `slot`. Returns false for an unknown slot.
    pub fn force_disable(&self, slot: &str) -> bool {
        let mut state = self.state();
        match state.records.iter_mut().find(|r| r.slot == slot) {
            Some(record) => {
                record.manually_disabled = true;
                tracing::info!(slot = %record.slot, key = %record.masked(), "Key locked");
                true
            }
            None => false,
        }
    }

    /// Unlock a key and clear its cooldown and failure count.
    /// Returns false for an unknown slot.
    pub fn enable(&self, slot: &str) -> bool {
        let mut state = self.state();
        match state.records.iter_mut().find(|r| r.slot == slot) {
            Some(record) => {
                record.manually_disabled = false;
                record.disabled_until = None;
                record.failure_count = 0;
                tracing::info!(slot = %record.slot, key = %record.masked(), "Key unlocked");
                true
            }
            None => false,
        }
    }

    /// Clear a key's cooldown and failure count, leaving a manual lock in place.
    /// Returns false for an unknown slot.
    pub fn reset_key(&self, slot: &str) -> bool {
        let mut state = self.state();
        match state.records.iter_mut().find(|r| r.slot == slot) {
            Some(record) => {
                record.disabled_until = None;
                record.failure_count = 0;
                tracing::info!(slot = %record.slot, key = %record.masked(), "Key reset");
                true
            }
            None => false,
        }
    }

    /// Snapshot of every key, including full secrets.
    ///
    /// Callers must apply [`KeyPoolStatus::redacted`] before handing the
    /// snapshot to anyone but the owner.
    pub fn status(&self) -> KeyPoolStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> KeyPoolStatus {
        let state = self.state();
        let keys: Vec<KeyStatus> = state.records.iter().map(|r| r.to_status(now)).collect();
        KeyPoolStatus {
            total_keys: keys.len(),
            available_keys: keys.iter().filter(|k| k.available).count(),
            keys,
        }
    }
}
