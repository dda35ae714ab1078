//! Per-user daily usage accounting.

pub mod ledger;
pub mod memory;

pub use ledger::UsageLedger;
pub use memory::InMemoryUsageStore;
