//! HTTP/REST API layer for Interview AI.
//!
//! Axum-based REST API at `/api/v1/` with a generation endpoint, an
//! operator control surface behind bearer-token authentication, envelope
//! response format and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
