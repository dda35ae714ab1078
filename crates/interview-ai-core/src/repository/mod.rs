//! Repository trait definitions.
//!
//! Implemented by interview-ai-infra (SQLite) and by the in-memory store in
//! `crate::usage::memory`.

pub mod usage;
