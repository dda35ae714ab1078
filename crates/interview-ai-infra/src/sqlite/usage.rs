//! SQLite usage ledger store.
//!
//! Counters are bumped inside a single `INSERT .. ON CONFLICT DO UPDATE`
//! statement, so concurrent writers for the same user and day never lose
//! an increment.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

use interview_ai_core::repository::usage::UsageLogStore;
use interview_ai_types::error::RepositoryError;
use interview_ai_types::llm::ProviderKind;
use interview_ai_types::usage::{UsageLedgerEntry, UsageRecord};

use super::pool::DatabasePool;

const UPSERT_COUNTERS: &str = r#"INSERT INTO usage_ledger (user_id, date, openai_count, openrouter_count, created_at, updated_at)
       VALUES (?, ?, ?, ?, ?, ?)
       ON CONFLICT (user_id, date) DO UPDATE SET
           openai_count = openai_count + excluded.openai_count,
           openrouter_count = openrouter_count + excluded.openrouter_count,
           updated_at = excluded.updated_at"#;

const INSERT_RECORD: &str = r#"INSERT INTO usage_records (user_id, date, provider, model, status, tokens, timestamp, request_type, details)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#;

/// SQLite-backed [`UsageLogStore`].
pub struct SqliteUsageStore {
    pool: DatabasePool,
}

impl SqliteUsageStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Upsert the entry row, adding `openai`/`openrouter` to its counters.
    async fn upsert_counters<'e, E>(
        executor: E,
        user_id: &str,
        date: NaiveDate,
        openai: i64,
        openrouter: i64,
    ) -> Result<(), RepositoryError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let now = format_datetime(&Utc::now());
        sqlx::query(UPSERT_COUNTERS)
            .bind(user_id)
            .bind(format_date(date))
            .bind(openai)
            .bind(openrouter)
            .bind(now.clone())
            .bind(now)
            .execute(executor)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn insert_record<'e, E>(
        executor: E,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> Result<(), RepositoryError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(INSERT_RECORD)
            .bind(user_id)
            .bind(format_date(date))
            .bind(record.provider.to_string())
            .bind(&record.model)
            .bind(record.status.to_string())
            .bind(record.tokens.map(i64::from))
            .bind(format_datetime(&record.timestamp))
            .bind(&record.request_type)
            .bind(&record.details)
            .execute(executor)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn load_records(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, UsageRecord)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM usage_records WHERE user_id = ? AND date >= ? ORDER BY id",
        )
        .bind(user_id)
        .bind(format_date(since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let sql_row =
                RecordSqlRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            records.push(sql_row.into_record()?);
        }
        Ok(records)
    }
}

fn counter_deltas(provider: ProviderKind) -> (i64, i64) {
    match provider {
        ProviderKind::OpenAi => (1, 0),
        ProviderKind::OpenRouter => (0, 1),
    }
}

impl UsageLogStore for SqliteUsageStore {
    async fn find_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<UsageLedgerEntry>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM usage_ledger WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(format_date(date))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut entry = EntrySqlRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_entry()?;
        entry.requests = self
            .load_records(user_id, date)
            .await?
            .into_iter()
            .filter(|(d, _)| *d == date)
            .map(|(_, r)| r)
            .collect();
        Ok(Some(entry))
    }

    async fn find_or_create(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<UsageLedgerEntry, RepositoryError> {
        Self::upsert_counters(&self.pool.writer, user_id, date, 0, 0).await?;
        self.find_entry(user_id, date)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn increment(
        &self,
        user_id: &str,
        date: NaiveDate,
        provider: ProviderKind,
    ) -> Result<(), RepositoryError> {
        let (openai, openrouter) = counter_deltas(provider);
        Self::upsert_counters(&self.pool.writer, user_id, date, openai, openrouter).await
    }

    async fn append_record(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Self::upsert_counters(&mut *tx, user_id, date, 0, 0).await?;
        Self::insert_record(&mut *tx, user_id, date, record).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn record_call(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: &UsageRecord,
    ) -> Result<(), RepositoryError> {
        let (openai, openrouter) = counter_deltas(record.provider);
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Self::upsert_counters(&mut *tx, user_id, date, openai, openrouter).await?;
        Self::insert_record(&mut *tx, user_id, date, record).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn list_entries(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<UsageLedgerEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM usage_ledger WHERE user_id = ? AND date >= ? ORDER BY date DESC",
        )
        .bind(user_id)
        .bind(format_date(since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let entry = EntrySqlRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_entry()?;
            entries.push(entry);
        }

        for (date, record) in self.load_records(user_id, since).await? {
            if let Some(entry) = entries.iter_mut().find(|e| e.date == date) {
                entry.requests.push(record);
            }
        }

        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct EntrySqlRow {
    user_id: String,
    date: String,
    openai_count: i64,
    openrouter_count: i64,
}

impl EntrySqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            date: row.try_get("date")?,
            openai_count: row.try_get("openai_count")?,
            openrouter_count: row.try_get("openrouter_count")?,
        })
    }

    fn into_entry(self) -> Result<UsageLedgerEntry, RepositoryError> {
        let mut entry = UsageLedgerEntry::new(self.user_id, parse_date(&self.date)?);
        entry.openai_count = self.openai_count as u32;
        entry.openrouter_count = self.openrouter_count as u32;
        Ok(entry)
    }
}

struct RecordSqlRow {
    date: String,
    provider: String,
    model: String,
    status: String,
    tokens: Option<i64>,
    timestamp: String,
    request_type: String,
    details: Option<String>,
}

impl RecordSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            date: row.try_get("date")?,
            provider: row.try_get("provider")?,
            model: row.try_get("model")?,
            status: row.try_get("status")?,
            tokens: row.try_get("tokens")?,
            timestamp: row.try_get("timestamp")?,
            request_type: row.try_get("request_type")?,
            details: row.try_get("details")?,
        })
    }

    fn into_record(self) -> Result<(NaiveDate, UsageRecord), RepositoryError> {
        let record = UsageRecord {
            provider: self.provider.parse().map_err(RepositoryError::Query)?,
            model: self.model,
            status: self.status.parse().map_err(RepositoryError::Query)?,
            tokens: self.tokens.map(|t| t as u32),
            timestamp: parse_datetime(&self.timestamp)?,
            request_type: self.request_type,
            details: self.details,
        };
        Ok((parse_date(&self.date)?, record))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Query(format!("invalid date: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
