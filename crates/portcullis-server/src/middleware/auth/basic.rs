//! Static-credential gate for operator endpoints.

use super::types::AuthFailure;
use crate::config::BasicAuthConfig;
use crate::error::ApiError;
use crate::monitoring::Metrics;
use axum::{
    body::Body,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

/// Compare two secrets without leaking where they differ.
pub fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    fn check(&self, headers: &HeaderMap) -> bool {
        let Some(Authorization(basic)) = headers.typed_get::<Authorization<Basic>>() else {
            return false;
        };
        // Evaluate both so a wrong username costs the same as a wrong password.
        let user_ok = constant_time_eq(basic.username(), &self.username);
        let pass_ok = constant_time_eq(basic.password(), &self.password);
        user_ok & pass_ok
    }
}

/// Rejects requests lacking the configured basic-auth credentials.
#[derive(Clone)]
pub struct BasicAuthLayer {
    credentials: Arc<Credentials>,
    metrics: Arc<Metrics>,
}

impl BasicAuthLayer {
    pub fn new(config: &BasicAuthConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            credentials: Arc::new(Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            }),
            metrics,
        }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthMiddleware {
            inner,
            credentials: self.credentials.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BasicAuthMiddleware<S> {
    inner: S,
    credentials: Arc<Credentials>,
    metrics: Arc<Metrics>,
}

impl<S> Service<Request<Body>> for BasicAuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if !self.credentials.check(req.headers()) {
            self.metrics.auth_failure(AuthFailure::BasicAuth);
            let response = ApiError::Unauthorized(AuthFailure::BasicAuth).into_response();
            return Box::pin(async move { Ok(response) });
        }

        let future = self.inner.call(req);
        Box::pin(future)
    }
}
