//! Route configuration for the Portcullis API server.

mod internal;
mod v1;

use crate::error::ApiError;
use crate::middleware::RateLimitLayer;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the main application router.
///
/// The rate limiter wraps everything else, so a rejected request never
/// reaches authentication or storage.
pub fn create_router(state: AppState) -> Router {
    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(TimeoutLayer::new(state.config.server.request_timeout()));

    let rate_limit = RateLimitLayer::new(state.limiter.clone(), state.metrics.clone())
        .trust_forwarded_headers(state.config.rate_limit.trust_forwarded_headers);

    Router::new()
        .nest("/v1", v1::router(state.clone()))
        .fallback(fallback_handler)
        .layer(common_middleware)
        .layer(rate_limit)
        .with_state(state)
}

async fn fallback_handler() -> ApiError {
    ApiError::NotFound("resource".to_string())
}
