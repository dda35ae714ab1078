//! Operator control surface for the generation core.
//!
//! - GET  /api/v1/admin/ai/status
//! - POST /api/v1/admin/ai/keys/{id}/lock|unlock|reset
//! - GET  /api/v1/admin/ai/usage/{user_id}?days=N
//!
//! `{id}` is a key slot name (`OPENROUTER_API_KEY_2`). Key values are never
//! accepted in paths, since request URIs end up in trace logs. Full key
//! values are only returned to the owner.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use interview_ai_types::error::KeyPoolError;
use interview_ai_types::llm::{KeyPoolStatus, SystemStatus};
use interview_ai_types::usage::UsageLedgerEntry;

use crate::http::error::AppError;
use crate::http::extractors::auth::OperatorAuth;
use crate::http::extractors::query::UsageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UsageReport {
    pub user_id: String,
    pub days: u32,
    pub daily_secondary_limit: u32,
    /// Secondary calls left today for a non-premium caller.
    pub remaining_secondary_today: Option<u32>,
    pub entries: Vec<UsageLedgerEntry>,
}

/// GET /api/v1/admin/ai/status
pub async fn get_status(
    State(state): State<AppState>,
    auth: OperatorAuth,
) -> Result<Json<ApiResponse<SystemStatus>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let mut status = state.router.system_status();
    if !auth.is_owner() {
        status = status.redacted();
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(status, request_id, elapsed)))
}

/// POST /api/v1/admin/ai/keys/{id}/lock
pub async fn lock_key(
    State(state): State<AppState>,
    auth: OperatorAuth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<KeyPoolStatus>>, AppError> {
    key_action(&state, auth, &id, "lock", |s, id| s.router.lock_key(id))
}

/// POST /api/v1/admin/ai/keys/{id}/unlock
pub async fn unlock_key(
    State(state): State<AppState>,
    auth: OperatorAuth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<KeyPoolStatus>>, AppError> {
    key_action(&state, auth, &id, "unlock", |s, id| s.router.unlock_key(id))
}

/// POST /api/v1/admin/ai/keys/{id}/reset
pub async fn reset_key(
    State(state): State<AppState>,
    auth: OperatorAuth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<KeyPoolStatus>>, AppError> {
    key_action(&state, auth, &id, "reset", |s, id| s.router.reset_key(id))
}

/// Apply `action` and answer with the pool snapshot after it.
fn key_action(
    state: &AppState,
    auth: OperatorAuth,
    id: &str,
    name: &'static str,
    action: impl FnOnce(&AppState, &str) -> Result<(), KeyPoolError>,
) -> Result<Json<ApiResponse<KeyPoolStatus>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    action(state, id)?;
    let key = state.router.key_pool().resolve(id).unwrap_or_default();
    tracing::info!(action = name, slot = %id, %key, role = ?auth.role, "Operator key action applied");

    let mut pool = state.router.key_pool().status();
    if !auth.is_owner() {
        pool = pool.redacted();
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(pool, request_id, elapsed)))
}

/// GET /api/v1/admin/ai/usage/{user_id}?days=N
pub async fn get_usage(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(user_id): Path<String>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<ApiResponse<UsageReport>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let ledger = state.router.ledger();
    let entries = ledger.report(&user_id, query.days).await?;
    let remaining = ledger.remaining_secondary_quota(&user_id, false).await?;

    let report = UsageReport {
        user_id,
        days: query.days.max(1),
        daily_secondary_limit: ledger.daily_limit(),
        remaining_secondary_today: remaining,
        entries,
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(report, request_id, elapsed)))
}
