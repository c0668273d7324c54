//! Public credential API
//!
//! - POST /api/auth/login   - username/password -> credential pair
//! - POST /api/auth/refresh - refresh token -> new credential pair
//! - POST /api/auth/logout  - invalidate a refresh token (Bearer required)
//! - GET  /api/auth/me      - identity of the Bearer token
//! - GET  /health
//! - GET  /metrics

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use credential_manager::{CredentialManager, CredentialPair};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{StaticAuthenticator, bearer_token};
use crate::error::ApiError;
use crate::metrics;

/// Shared application state accessible from all public handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CredentialManager>,
    pub authenticator: Arc<StaticAuthenticator>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
}

/// Build the public router. `max_connections` caps concurrent requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

fn pair_response(pair: &CredentialPair) -> Response {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!(pair).to_string(),
    )
        .into_response()
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    let identity = match state.authenticator.authenticate(&req.username, &req.password) {
        Ok(identity) => identity,
        Err(e) => {
            metrics::record_login_failure();
            warn!(username = %req.username, "login rejected");
            return Err(e);
        }
    };

    let pair = state.manager.login(&identity).await?;
    metrics::record_credentials_issued("login");
    Ok(pair_response(&pair))
}

async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    match state.manager.rotate(&req.refresh_token).await {
        Ok(pair) => {
            metrics::record_credentials_issued("rotate");
            Ok(pair_response(&pair))
        }
        Err(e) => {
            metrics::record_refresh_rejected("rotate");
            Err(e.into())
        }
    }
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.manager.verify_access(bearer_token(&headers)?)?;
    let Json(req) = body?;

    if let Err(e) = state.manager.logout(&req.refresh_token).await {
        metrics::record_refresh_rejected("logout");
        return Err(e.into());
    }

    info!(identity = %claims.sub, "logged out");
    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "status": "logged_out" }).to_string(),
    ))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.manager.verify_access(bearer_token(&headers)?)?;
    Ok((
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "username": claims.sub }).to_string(),
    ))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.manager.store().len().await;
    metrics::set_store_records(records);

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": "healthy",
            "uptime_seconds": state.started_at.elapsed().as_secs(),
            "refresh_records": records,
        })
        .to_string(),
    )
}

/// Prometheus text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    metrics::set_store_records(state.manager.store().len().await);
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
