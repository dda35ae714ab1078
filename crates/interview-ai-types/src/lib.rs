//! Shared domain types for the Interview AI generation core.
//!
//! Key pool snapshots, usage ledger entries, generation requests, provider
//! results, configuration and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod usage;
