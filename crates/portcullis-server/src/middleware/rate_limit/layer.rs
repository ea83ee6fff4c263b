//! Rate limit middleware layer.

use super::limiter::RateLimiter;
use super::types::Admission;
use crate::{error::ApiError, monitoring::Metrics};
use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::debug;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Rate limit layer. Installed outermost so rejected requests do no other
/// work.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: RateLimiter,
    metrics: Arc<Metrics>,
    trust_forwarded: bool,
}

impl RateLimitLayer {
    /// Keys clients by peer address only.
    pub fn new(limiter: RateLimiter, metrics: Arc<Metrics>) -> Self {
        Self {
            limiter,
            metrics,
            trust_forwarded: false,
        }
    }

    /// Key clients by the proxy-supplied forwarding headers when present.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
            metrics: self.metrics.clone(),
            trust_forwarded: self.trust_forwarded,
        }
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: RateLimiter,
    metrics: Arc<Metrics>,
    trust_forwarded: bool,
}

impl<S> Service<Request> for RateLimitMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let limiter = self.limiter.clone();
        let metrics = self.metrics.clone();
        let mut inner = self.inner.clone();
        let key = client_key(&req, self.trust_forwarded);

        Box::pin(async move {
            let Some(admission) = limiter.allow(&key, Instant::now()).await else {
                return inner.call(req).await;
            };

            if !admission.allowed {
                metrics.rate_limited();
                debug!(client = %key, "rate limit exceeded");
                let retry_after = admission.retry_after_secs().unwrap_or(1);
                let mut response = ApiError::RateLimited { retry_after }.into_response();
                add_rate_limit_headers(response.headers_mut(), &admission);
                return Ok(response);
            }

            let mut response = inner.call(req).await?;
            add_rate_limit_headers(response.headers_mut(), &admission);
            Ok(response)
        })
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, admission: &Admission) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(
        X_RATELIMIT_REMAINING,
        HeaderValue::from(admission.remaining),
    );
}

/// Client identity. With `trust_forwarded` set: first `X-Forwarded-For` hop,
/// then `X-Real-IP`, then the peer address. Otherwise only the peer address,
/// since clients can set those headers to anything.
pub fn client_key(req: &Request, trust_forwarded: bool) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    let forwarded = || {
        header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip").filter(|v| !v.is_empty()))
    };

    trust_forwarded
        .then(forwarded)
        .flatten()
        .map(String::from)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
