//! SQLite storage layer.
//!
//! The usage ledger store, backed by SQLite in WAL mode with split
//! read/write connection pools.

pub mod pool;
pub mod usage;
