//! Operator routes: health and metrics, behind the basic-auth gate.

use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit::RateLimitMode;
use crate::middleware::BasicAuthLayer;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

pub fn router(state: AppState) -> Router<AppState> {
    let gate = BasicAuthLayer::new(&state.config.auth.basic, state.metrics.clone());

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route_layer(gate)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.users.backend();
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "env": state.config.server.env,
        "cache": {
            "backend": cache.backend(),
            "stats": cache.stats().await,
        },
        "rate_limit": rate_limit_summary(state.limiter.mode()),
    }))
}

fn rate_limit_summary(mode: RateLimitMode) -> Value {
    match mode {
        RateLimitMode::Disabled => json!({ "enabled": false }),
        RateLimitMode::FixedWindow(config) => json!({
            "enabled": true,
            "limit": config.limit,
            "window_secs": config.window.as_secs_f64(),
        }),
    }
}

async fn prometheus_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
