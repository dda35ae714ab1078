//! Text generation endpoint.
//!
//! POST /api/v1/ai/generate - Run a prompt through the failover router.
//!
//! Only trusted callers may use it: `user_id` and `is_premium_user` decide
//! fallback eligibility, so they are taken on the caller's word.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use interview_ai_types::llm::{GenerationMetadata, GenerationOptions, DEFAULT_FEATURE_TYPE};

use crate::http::error::AppError;
use crate::http::extractors::auth::CallerAuth;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for text generation.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_premium_user: bool,
    #[serde(default)]
    pub feature_type: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

impl GenerateRequest {
    fn metadata(&self) -> GenerationMetadata {
        GenerationMetadata {
            user_id: self.user_id.clone().filter(|u| !u.trim().is_empty()),
            is_premium_user: self.is_premium_user,
            feature_type: self
                .feature_type
                .clone()
                .unwrap_or_else(|| DEFAULT_FEATURE_TYPE.to_string()),
            system_prompt: self.system_prompt.clone(),
        }
    }

    fn options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: self.response_format.clone(),
        }
    }
}

/// POST /api/v1/ai/generate
///
/// Errors carry the router's user-facing message: 429 when the caller is
/// out of fallback quota, 503 when no provider could answer.
pub async fn generate(
    State(state): State<AppState>,
    _caller: CallerAuth,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }

    let text = state
        .router
        .generate_text(&req.prompt, &req.metadata(), &req.options())
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        GenerateResponse { text },
        request_id,
        elapsed,
    )))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::http::router::build_router;
    use crate::state::testing::{test_state, ADMIN_TOKEN, CALLER_TOKEN};

    fn post_json(body: serde_json::Value) -> Request<Body> {
        post_json_as(Some(CALLER_TOKEN), body)
    }

    fn post_json_as(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut req = Request::post("/api/v1/ai/generate").header("content-type", "application/json");
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_generate_requires_caller_token() {
        let state = test_state(Ok("hello")).await;
        let app = build_router(state.clone());
        let body = serde_json::json!({
            "prompt": "hi",
            "user_id": "u1",
            "is_premium_user": true
        });

        let resp = app.clone().oneshot(post_json_as(None, body.clone())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .clone()
            .oneshot(post_json_as(Some("forged"), body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // Rejected calls never reach the router or the ledger.
        assert!(state.router.ledger().report("u1", 1).await.unwrap().is_empty());

        let resp = app.oneshot(post_json_as(Some(ADMIN_TOKEN), body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.router.ledger().report("u1", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_returns_text() {
        let state = test_state(Ok("hello")).await;
        let app = build_router(state.clone());

        let resp = app
            .oneshot(post_json(serde_json::json!({
                "prompt": "Ask me a question",
                "user_id": "u1",
                "feature_type": "mock_interview"
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let value = json_body(resp).await;
        assert_eq!(value["data"]["text"], "hello: Ask me a question");

        let entries = state.router.ledger().report("u1", 1).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].openrouter_count, 1);
        assert_eq!(entries[0].requests[0].request_type, "mock_interview");
    }

    #[tokio::test]
    async fn test_anonymous_caller_gets_429_when_primary_exhausted() {
        let app = build_router(test_state(Err(429)).await);

        let resp = app
            .oneshot(post_json(serde_json::json!({"prompt": "hi"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let value = json_body(resp).await;
        assert_eq!(value["errors"][0]["code"], "QUOTA_EXCEEDED");
        assert_eq!(
            value["errors"][0]["message"],
            "Service busy. Please try again later or upgrade for priority access."
        );
    }

    #[tokio::test]
    async fn test_eligible_caller_without_secondary_gets_503() {
        let app = build_router(test_state(Err(500)).await);

        let resp = app
            .oneshot(post_json(serde_json::json!({
                "prompt": "hi",
                "user_id": "u1",
                "is_premium_user": true
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let value = json_body(resp).await;
        assert_eq!(value["errors"][0]["code"], "AI_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let app = build_router(test_state(Ok("unused")).await);

        let resp = app
            .oneshot(post_json(serde_json::json!({"prompt": "   "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
