//! Infrastructure layer for Interview AI.
//!
//! Implements the ports defined in `interview-ai-core`: OpenRouter and
//! OpenAI chat-completion clients, the SQLite usage ledger store, plus
//! configuration and environment-key loading.

pub mod config;
pub mod env_keys;
pub mod llm;
pub mod sqlite;
