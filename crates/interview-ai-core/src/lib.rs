//! Generation routing core for Interview AI.
//!
//! Defines the ports (`ChatProvider`, `UsageLogStore`) that the
//! infrastructure layer implements, plus the key pool, usage ledger and
//! failover router built on top of them. Depends only on
//! `interview-ai-types` -- never on `interview-ai-infra` or any database/IO
//! crate.

pub mod llm;
pub mod repository;
pub mod usage;
