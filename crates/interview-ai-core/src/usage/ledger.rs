//! Usage ledger service.
//!
//! Decides whether a caller may use the quota-gated secondary provider and
//! records every provider call against the caller's daily entry. Store
//! failures never fail a generation: eligibility fails closed and
//! recording logs the error and moves on.

use chrono::{Days, NaiveDate, Utc};

use interview_ai_types::error::RepositoryError;
use interview_ai_types::llm::ProviderKind;
use interview_ai_types::usage::{ledger_date, UsageLedgerEntry, UsageRecord};

use crate::repository::usage::UsageLogStore;

pub struct UsageLedger<S> {
    store: S,
    daily_limit: u32,
}

impl<S: UsageLogStore> UsageLedger<S> {
    /// `daily_limit` is the number of secondary-provider calls a
    /// non-premium user may make per UTC day.
    pub fn new(store: S, daily_limit: u32) -> Self {
        Self { store, daily_limit }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Whether the caller may use the secondary provider today.
    pub async fn can_use_secondary_provider(&self, user_id: Option<&str>, is_premium: bool) -> bool {
        self.can_use_secondary_provider_on(user_id, is_premium, ledger_date(Utc::now()))
            .await
    }

    /// Eligibility check against an explicit ledger day.
    ///
    /// Anonymous callers are never eligible. Premium users are always
    /// eligible. Everyone else is eligible while today's secondary count is
    /// below the daily limit.
    pub async fn can_use_secondary_provider_on(
        &self,
        user_id: Option<&str>,
        is_premium: bool,
        date: NaiveDate,
    ) -> bool {
        let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) else {
            tracing::debug!("Anonymous caller, secondary provider denied");
            return false;
        };

        if is_premium {
            return true;
        }

        // Read-only: no entry yet means no secondary calls today.
        match self.store.find_entry(user_id, date).await {
            Ok(entry) => {
                let used = entry.map(|e| e.count_for(ProviderKind::OpenAi)).unwrap_or(0);
                let allowed = used < self.daily_limit;
                if !allowed {
                    tracing::info!(
                        user_id,
                        used,
                        limit = self.daily_limit,
                        "Daily secondary-provider quota reached"
                    );
                }
                allowed
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Usage lookup failed, denying secondary provider");
                false
            }
        }
    }

    /// Record one provider call against the caller's entry for the record's day.
    ///
    /// Anonymous calls are not recorded. Store errors are logged, not returned.
    pub async fn record(&self, user_id: Option<&str>, record: UsageRecord) {
        let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) else {
            tracing::debug!(provider = %record.provider, "Anonymous call, not recorded");
            return;
        };

        let date = ledger_date(record.timestamp);
        match self.store.record_call(user_id, date, &record).await {
            Ok(()) => tracing::debug!(
                user_id,
                provider = %record.provider,
                status = %record.status,
                "Usage recorded"
            ),
            Err(e) => tracing::error!(
                user_id,
                provider = %record.provider,
                error = %e,
                "Failed to record usage"
            ),
        }
    }

    /// Secondary-provider calls left today. `None` means unlimited (premium).
    pub async fn remaining_secondary_quota(
        &self,
        user_id: &str,
        is_premium: bool,
    ) -> Result<Option<u32>, RepositoryError> {
        if is_premium {
            return Ok(None);
        }
        let today = ledger_date(Utc::now());
        let used = self
            .store
            .find_entry(user_id, today)
            .await?
            .map(|e| e.count_for(ProviderKind::OpenAi))
            .unwrap_or(0);
        Ok(Some(self.daily_limit.saturating_sub(used)))
    }

    /// The user's entries for the last `days` UTC days (today included), newest first.
    pub async fn report(&self, user_id: &str, days: u32) -> Result<Vec<UsageLedgerEntry>, RepositoryError> {
        self.report_from(user_id, days, ledger_date(Utc::now())).await
    }

    pub async fn report_from(
        &self,
        user_id: &str,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<UsageLedgerEntry>, RepositoryError> {
        let span = u64::from(days.max(1) - 1);
        let since = today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        self.store.list_entries(user_id, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::memory::InMemoryUsageStore;
    use interview_ai_types::usage::CallOutcome;

    fn record(provider: ProviderKind, status: CallOutcome) -> UsageRecord {
        UsageRecord {
            provider,
            model: "gpt-4o-mini".to_string(),
            status,
            tokens: None,
            timestamp: Utc::now(),
            request_type: "general".to_string(),
            details: None,
        }
    }

    /// A store whose every call fails.
    struct BrokenStore;

    impl UsageLogStore for BrokenStore {
        async fn find_entry(&self, _: &str, _: NaiveDate) -> Result<Option<UsageLedgerEntry>, RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn find_or_create(&self, _: &str, _: NaiveDate) -> Result<UsageLedgerEntry, RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn increment(&self, _: &str, _: NaiveDate, _: ProviderKind) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn append_record(&self, _: &str, _: NaiveDate, _: &UsageRecord) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn list_entries(&self, _: &str, _: NaiveDate) -> Result<Vec<UsageLedgerEntry>, RepositoryError> {
            Err(RepositoryError::Connection)
        }
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_never_eligible() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 10);
        assert!(!ledger.can_use_secondary_provider(None, false).await);
        assert!(!ledger.can_use_secondary_provider(None, true).await);
        assert!(!ledger.can_use_secondary_provider(Some(""), true).await);
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 10);
        for _ in 0..9 {
            ledger
                .record(Some("u1"), record(ProviderKind::OpenAi, CallOutcome::Success))
                .await;
        }
        assert!(ledger.can_use_secondary_provider(Some("u1"), false).await);

        ledger
            .record(Some("u1"), record(ProviderKind::OpenAi, CallOutcome::Success))
            .await;
        assert!(!ledger.can_use_secondary_provider(Some("u1"), false).await);
        // Premium ignores the counter.
        assert!(ledger.can_use_secondary_provider(Some("u1"), true).await);
    }

    #[tokio::test]
    async fn test_eligibility_check_does_not_create_entry() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 10);
        let today = ledger_date(Utc::now());

        assert!(ledger.can_use_secondary_provider_on(Some("u1"), false, today).await);
        assert!(ledger.store().find_entry("u1", today).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_primary_calls_do_not_consume_quota() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 1);
        for _ in 0..5 {
            ledger
                .record(Some("u1"), record(ProviderKind::OpenRouter, CallOutcome::Success))
                .await;
        }
        assert!(ledger.can_use_secondary_provider(Some("u1"), false).await);
    }

    #[tokio::test]
    async fn test_failed_calls_count_toward_quota() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 1);
        ledger
            .record(Some("u1"), record(ProviderKind::OpenAi, CallOutcome::Failure))
            .await;
        assert!(!ledger.can_use_secondary_provider(Some("u1"), false).await);
    }

    #[tokio::test]
    async fn test_yesterday_usage_does_not_count_today() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 1);
        let today = ledger_date(Utc::now());
        let yesterday = today.pred_opt().unwrap();
        ledger
            .store()
            .increment("u1", yesterday, ProviderKind::OpenAi)
            .await
            .unwrap();
        assert!(ledger.can_use_secondary_provider_on(Some("u1"), false, today).await);
        assert!(!ledger.can_use_secondary_provider_on(Some("u1"), false, yesterday).await);
    }

    #[tokio::test]
    async fn test_anonymous_calls_are_not_recorded() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 10);
        ledger
            .record(None, record(ProviderKind::OpenAi, CallOutcome::Success))
            .await;
        let today = ledger_date(Utc::now());
        assert!(ledger.store().list_entries("", today).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let ledger = UsageLedger::new(BrokenStore, 10);
        assert!(!ledger.can_use_secondary_provider(Some("u1"), false).await);
        // Premium does not touch the store.
        assert!(ledger.can_use_secondary_provider(Some("u1"), true).await);
        // Recording swallows the error.
        ledger
            .record(Some("u1"), record(ProviderKind::OpenAi, CallOutcome::Success))
            .await;
    }

    #[tokio::test]
    async fn test_remaining_quota() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 3);
        assert_eq!(ledger.remaining_secondary_quota("u1", false).await.unwrap(), Some(3));
        ledger
            .record(Some("u1"), record(ProviderKind::OpenAi, CallOutcome::Success))
            .await;
        assert_eq!(ledger.remaining_secondary_quota("u1", false).await.unwrap(), Some(2));
        assert_eq!(ledger.remaining_secondary_quota("u1", true).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_report_window() {
        let ledger = UsageLedger::new(InMemoryUsageStore::new(), 10);
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        for offset in [0u64, 1, 6, 7] {
            let date = today.checked_sub_days(Days::new(offset)).unwrap();
            ledger
                .store()
                .increment("u1", date, ProviderKind::OpenRouter)
                .await
                .unwrap();
        }

        let week = ledger.report_from("u1", 7, today).await.unwrap();
        assert_eq!(week.len(), 3);
        assert_eq!(week[0].date, today);

        let only_today = ledger.report_from("u1", 0, today).await.unwrap();
        assert_eq!(only_today.len(), 1);
    }
}
