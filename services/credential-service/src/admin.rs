//! Admin API for credential revocation
//!
//! Runs on a separate listener (default 9090) and must not be exposed
//! publicly; it has no authentication of its own.
//!
//! Endpoints:
//! - POST /admin/revoke-all             - revoke every refresh credential of a user
//! - GET  /admin/identities/{username}  - live session count for a user
//! - GET  /admin/store                  - refresh store summary

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use credential_manager::CredentialManager;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::metrics;

/// Shared state for admin API handlers.
#[derive(Clone)]
pub struct AdminState {
    manager: Arc<CredentialManager>,
}

impl AdminState {
    pub fn new(manager: Arc<CredentialManager>) -> Self {
        Self { manager }
    }
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/revoke-all", post(revoke_all))
        .route("/admin/identities/{username}", get(identity_sessions))
        .route("/admin/store", get(store_summary))
        .with_state(state)
}

#[derive(Deserialize)]
struct RevokeAllRequest {
    username: String,
}

/// POST /admin/revoke-all. Idempotent; revoking a user with no sessions
/// reports zero.
async fn revoke_all(
    State(state): State<AdminState>,
    body: Result<Json<RevokeAllRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    if req.username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".into()));
    }

    let revoked = state.manager.revoke_all(&req.username).await?;
    metrics::record_refresh_revoked(revoked);
    info!(username = %req.username, revoked, "admin revoke-all");

    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "username": req.username, "revoked": revoked }).to_string(),
    ))
}

async fn identity_sessions(
    State(state): State<AdminState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let active = state.manager.active_sessions(&username).await;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "username": username, "active_sessions": active }).to_string(),
    )
}

/// GET /admin/store. Counts physically held records, expired ones included.
async fn store_summary(State(state): State<AdminState>) -> impl IntoResponse {
    let records = state.manager.store().len().await;
    metrics::set_store_records(records);
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "records": records }).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::test_manager;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn revoke_request(username: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/admin/revoke-all")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "username": username }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn revoke_all_reports_count_and_is_idempotent() {
        let manager = test_manager();
        let a1 = manager.login("alice").await.unwrap();
        manager.login("alice").await.unwrap();
        let b1 = manager.login("bob").await.unwrap();
        let app = build_admin_router(AdminState::new(manager.clone()));

        let (status, json) = send(&app, revoke_request("alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["revoked"], 2);

        let (_, json) = send(&app, revoke_request("alice")).await;
        assert_eq!(json["revoked"], 0);

        assert!(manager.rotate(&a1.refresh_token).await.is_err());
        assert!(manager.rotate(&b1.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn revoke_all_rejects_empty_username() {
        let app = build_admin_router(AdminState::new(test_manager()));
        let (status, json) = send(&app, revoke_request("")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn identity_sessions_counts_live_credentials() {
        let manager = test_manager();
        manager.login("alice").await.unwrap();
        let pair = manager.login("alice").await.unwrap();
        manager.logout(&pair.refresh_token).await.unwrap();
        let app = build_admin_router(AdminState::new(manager));

        let request = Request::builder()
            .uri("/admin/identities/alice")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["active_sessions"], 1);

        let request = Request::builder()
            .uri("/admin/identities/nobody")
            .body(Body::empty())
            .unwrap();
        let (_, json) = send(&app, request).await;
        assert_eq!(json["active_sessions"], 0);
    }

    #[tokio::test]
    async fn store_summary_counts_records() {
        let manager = test_manager();
        manager.login("alice").await.unwrap();
        manager.login("bob").await.unwrap();
        let app = build_admin_router(AdminState::new(manager));

        let request = Request::builder()
            .uri("/admin/store")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["records"], 2);
    }

    #[tokio::test]
    async fn public_routes_are_not_served_here() {
        let app = build_admin_router(AdminState::new(test_manager()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
