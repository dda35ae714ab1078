//! Chat provider abstractions and routing.
//!
//! - `ChatProvider`: RPITIT trait for concrete provider clients
//! - `BoxChatProvider`: object-safe wrapper for dynamic dispatch
//! - `KeyPool`: round-robin primary key rotation with cooldowns
//! - `FailoverRouter`: two-stage primary/secondary routing
//! - `ChatModelAdapter`: message-list front end for the router

pub mod adapter;
pub mod box_provider;
pub mod key_pool;
pub mod provider;
pub mod router;
