//! Usage ledger types.
//!
//! One [`UsageLedgerEntry`] exists per user per UTC calendar day. It carries
//! per-provider call counters and an append-only audit trail of
//! [`UsageRecord`]s.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::ProviderKind;

/// Outcome recorded for a provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    Failure,
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Success => write!(f, "success"),
            CallOutcome::Failure => write!(f, "failure"),
        }
    }
}

impl FromStr for CallOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(CallOutcome::Success),
            "failure" => Ok(CallOutcome::Failure),
            other => Err(format!("invalid call outcome: '{other}'")),
        }
    }
}

/// One audit-trail line in a ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub provider: ProviderKind,
    pub model: String,
    pub status: CallOutcome,
    #[serde(default)]
    pub tokens: Option<u32>,
    pub timestamp: DateTime<Utc>,
    /// Feature that issued the call (the metadata's `feature_type`).
    pub request_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Per-user, per-day usage counters plus audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLedgerEntry {
    pub user_id: String,
    /// UTC calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub openai_count: u32,
    pub openrouter_count: u32,
    #[serde(default)]
    pub requests: Vec<UsageRecord>,
}

impl UsageLedgerEntry {
    /// A fresh entry with zero counters.
    pub fn new(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            openai_count: 0,
            openrouter_count: 0,
            requests: Vec::new(),
        }
    }

    pub fn count_for(&self, provider: ProviderKind) -> u32 {
        match provider {
            ProviderKind::OpenAi => self.openai_count,
            ProviderKind::OpenRouter => self.openrouter_count,
        }
    }

    /// Bump the counter for `provider` by one.
    pub fn increment(&mut self, provider: ProviderKind) {
        match provider {
            ProviderKind::OpenAi => self.openai_count += 1,
            ProviderKind::OpenRouter => self.openrouter_count += 1,
        }
    }
}

/// The ledger day a timestamp falls on.
pub fn ledger_date(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}
