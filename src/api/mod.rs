//! REST API endpoints.
//!
//! Axum-based HTTP API for population statistics, hypothesis tests,
//! leaderboards and per-player badges.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::engine::EngineError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Assemble the full router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/statistics/descriptive",
            get(routes::statistics::descriptive),
        )
        .route("/api/statistics/refresh", post(routes::statistics::refresh))
        .route(
            "/api/statistics/class-comparison",
            get(routes::statistics::class_comparison),
        )
        .route(
            "/api/statistics/correlation",
            get(routes::statistics::correlation),
        )
        .route(
            "/api/statistics/distribution",
            get(routes::statistics::distribution),
        )
        .route(
            "/api/statistics/hypothesis-tests",
            get(routes::statistics::hypothesis_tests),
        )
        .route(
            "/api/statistics/leaderboard",
            get(routes::statistics::leaderboard),
        )
        .route(
            "/api/gamification/badges",
            get(routes::gamification::badge_catalog),
        )
        .route(
            "/api/players/:player_id/statistics",
            get(routes::players::player_statistics),
        )
        .route(
            "/api/players/:player_id/badges",
            get(routes::players::player_badges),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
