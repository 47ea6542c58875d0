//! HTTP API
//!
//! `POST /api/check-access` takes a JSON `{email, environment}` body and
//! returns the access report; `GET /health` is the liveness probe.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::checker::AccessChecker;
use crate::error::AccessCheckError;
use crate::models::{AccessCheckResponse, AccessRequest};

#[derive(Clone)]
pub struct AppState {
    pub checker: AccessChecker,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/check-access", post(check_access))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "oncall-access-checker",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn check_access(
    State(state): State<AppState>,
    payload: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Json<AccessCheckResponse>, AccessCheckError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        AccessCheckError::Validation(rejection.body_text())
    })?;

    debug!(
        "Processing request for email: {}, environment: {}",
        request.email, request.environment
    );

    let report = state.checker.check_access(&request).await?;
    Ok(Json(report))
}
