//! Usage ledger repository trait definition.

use chrono::NaiveDate;

use interview_ai_types::error::RepositoryError;
use interview_ai_types::llm::ProviderKind;
use interview_ai_types::usage::{UsageLedgerEntry, UsageRecord};

/// Persistent store for per-user, per-day usage entries.
///
/// There is at most one entry per `(user_id, date)`. Counter increments and
/// record appends must be upserts: if two writers race on a missing entry,
/// both updates land on the single entry that ends up existing.
pub trait UsageLogStore: Send + Sync {
    /// Look up the entry for a user and day.
    fn find_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<UsageLedgerEntry>, RepositoryError>> + Send;

    /// Return the entry for a user and day, creating a zeroed one if absent.
    fn find_or_create(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<UsageLedgerEntry, RepositoryError>> + Send;

    /// Add one to the provider's counter, creating the entry if absent.
    fn increment(
        &self,
        user_id: &str,
        date: NaiveDate,
        provider: ProviderKind,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append an audit record, creating the entry if absent.
    fn append_record(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Increment the record's provider counter and append the record.
    ///
    /// Stores that can do both atomically should override this.
    fn record_call(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        async move {
            self.increment(user_id, date, record.provider).await?;
            self.append_record(user_id, date, record).await
        }
    }

    /// Entries for a user dated on or after `since`, newest first.
    fn list_entries(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<UsageLedgerEntry>, RepositoryError>> + Send;
}
