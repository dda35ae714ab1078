//! In-memory usage store.
//!
//! Used by tests and by `iai generate` when no database is wanted. Entries
//! are lost on drop.

use chrono::NaiveDate;
use dashmap::DashMap;

use interview_ai_types::error::RepositoryError;
use interview_ai_types::llm::ProviderKind;
use interview_ai_types::usage::{UsageLedgerEntry, UsageRecord};

use crate::repository::usage::UsageLogStore;

/// DashMap-backed [`UsageLogStore`].
///
/// Each mutation goes through `DashMap::entry`, which holds the shard lock
/// for the whole read-modify-write, so concurrent upserts never lose an
/// update.
#[derive(Default)]
pub struct InMemoryUsageStore {
    entries: DashMap<(String, NaiveDate), UsageLedgerEntry>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&self, user_id: &str, date: NaiveDate, f: impl FnOnce(&mut UsageLedgerEntry)) {
        let mut entry = self
            .entries
            .entry((user_id.to_string(), date))
            .or_insert_with(|| UsageLedgerEntry::new(user_id, date));
        f(entry.value_mut());
    }
}

impl UsageLogStore for InMemoryUsageStore {
    async fn find_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<UsageLedgerEntry>, RepositoryError> {
        Ok(self
            .entries
            .get(&(user_id.to_string(), date))
            .map(|e| e.value().clone()))
    }

    async fn find_or_create(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<UsageLedgerEntry, RepositoryError> {
        let entry = self
            .entries
            .entry((user_id.to_string(), date))
            .or_insert_with(|| UsageLedgerEntry::new(user_id, date));
        Ok(entry.value().clone())
    }

    async fn increment(
        &self,
        user_id: &str,
        date: NaiveDate,
        provider: ProviderKind,
    ) -> Result<(), RepositoryError> {
        self.upsert(user_id, date, |entry| entry.increment(provider));
        Ok(())
    }

    async fn append_record(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> Result<(), RepositoryError> {
        self.upsert(user_id, date, |entry| entry.requests.push(record.clone()));
        Ok(())
    }

    async fn record_call(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> Result<(), RepositoryError> {
        self.upsert(user_id, date, |entry| {
            entry.increment(record.provider);
            entry.requests.push(record.clone());
        });
        Ok(())
    }

    async fn list_entries(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<UsageLedgerEntry>, RepositoryError> {
        let mut entries: Vec<UsageLedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == user_id && e.key().1 >= since)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use interview_ai_types::usage::CallOutcome;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn record(provider: ProviderKind) -> UsageRecord {
        UsageRecord {
            provider,
            model: "gpt-4o-mini".to_string(),
            status: CallOutcome::Success,
            tokens: Some(42),
            timestamp: Utc::now(),
            request_type: "qa_session".to_string(),
            details: None,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let store = InMemoryUsageStore::new();
        assert!(store.find_entry("u1", day(1)).await.unwrap().is_none());

        let created = store.find_or_create("u1", day(1)).await.unwrap();
        assert_eq!(created.openai_count, 0);
        store.increment("u1", day(1), ProviderKind::OpenAi).await.unwrap();

        let again = store.find_or_create("u1", day(1)).await.unwrap();
        assert_eq!(again.openai_count, 1);
    }

    #[tokio::test]
    async fn test_record_call_updates_counter_and_trail() {
        let store = InMemoryUsageStore::new();
        store
            .record_call("u1", day(1), &record(ProviderKind::OpenRouter))
            .await
            .unwrap();

        let entry = store.find_entry("u1", day(1)).await.unwrap().unwrap();
        assert_eq!(entry.openrouter_count, 1);
        assert_eq!(entry.openai_count, 0);
        assert_eq!(entry.requests.len(), 1);
        assert_eq!(entry.requests[0].tokens, Some(42));
    }

    #[tokio::test]
    async fn test_entries_are_per_day() {
        let store = InMemoryUsageStore::new();
        store.increment("u1", day(1), ProviderKind::OpenAi).await.unwrap();
        store.increment("u1", day(2), ProviderKind::OpenAi).await.unwrap();
        store.increment("u2", day(2), ProviderKind::OpenAi).await.unwrap();

        let entries = store.list_entries("u1", day(1)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, day(2));
        assert_eq!(entries[1].date, day(1));

        let recent = store.list_entries("u1", day(2)).await.unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryUsageStore::new());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .record_call("u1", day(1), &record(ProviderKind::OpenAi))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entry = store.find_entry("u1", day(1)).await.unwrap().unwrap();
        assert_eq!(entry.openai_count, 20);
        assert_eq!(entry.requests.len(), 20);
    }
}
