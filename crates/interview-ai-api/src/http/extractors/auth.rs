//! Bearer token authentication extractors.
//!
//! - [`OperatorAuth`] guards the admin surface (owner/admin hashes).
//! - [`CallerAuth`] guards generation: trusted backends that have already
//!   authenticated the end user, plus any operator.
//!
//! Both read the token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and compared against the hashes in the
//! `[operators]` section of `config.toml`. With no hashes configured every
//! guarded request is refused.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use interview_ai_types::config::OperatorConfig;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRole {
    /// May see full key values in the status snapshot.
    Owner,
    Admin,
}

/// Authenticated operator. Extracting this validates the token.
#[derive(Debug, Clone, Copy)]
pub struct OperatorAuth {
    pub role: OperatorRole,
}

impl OperatorAuth {
    pub fn is_owner(&self) -> bool {
        self.role == OperatorRole::Owner
    }
}

impl FromRequestParts<AppState> for OperatorAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        match role_for_token(&state.config.operators, &token) {
            Some(role) => {
                tracing::debug!(?role, "Operator authenticated");
                Ok(OperatorAuth { role })
            }
            None => Err(AppError::Unauthorized(
                "Invalid operator token.".to_string(),
            )),
        }
    }
}

/// A backend trusted to state the end user's id and premium status.
#[derive(Debug, Clone, Copy)]
pub struct CallerAuth;

impl FromRequestParts<AppState> for CallerAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        if is_trusted_caller(&state.config.operators, &token) {
            Ok(CallerAuth)
        } else {
            Err(AppError::Unauthorized("Invalid caller token.".to_string()))
        }
    }
}

/// Caller tokens, and operator tokens, may generate.
pub fn is_trusted_caller(operators: &OperatorConfig, token: &str) -> bool {
    let digest = hash_token(token);
    operators
        .caller_token_sha256
        .iter()
        .any(|h| h.eq_ignore_ascii_case(&digest))
        || role_for_token(operators, token).is_some()
}

/// Resolve the role a plaintext token grants, if any.
pub fn role_for_token(operators: &OperatorConfig, token: &str) -> Option<OperatorRole> {
    let digest = hash_token(token);

    if operators
        .owner_token_sha256
        .as_deref()
        .is_some_and(|h| h.eq_ignore_ascii_case(&digest))
    {
        return Some(OperatorRole::Owner);
    }
    if operators
        .admin_token_sha256
        .iter()
        .any(|h| h.eq_ignore_ascii_case(&digest))
    {
        return Some(OperatorRole::Admin);
    }
    None
}

fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token) = parts.headers.get("x-api-key") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing bearer token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}
