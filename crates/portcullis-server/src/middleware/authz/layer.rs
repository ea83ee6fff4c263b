//! Authorization middleware layer.

use super::audit::log_authz;
use super::resource::OwnershipFact;
use super::types::AccessPolicy;
use crate::{
    error::ApiError,
    middleware::auth::{AuthFailure, AuthUser},
    monitoring::Metrics,
};
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

/// Enforces an [`AccessPolicy`] using the [`AuthUser`] and
/// [`OwnershipFact`] already in the request extensions.
#[derive(Clone)]
pub struct AuthzLayer {
    policy: AccessPolicy,
    metrics: Arc<Metrics>,
}

impl AuthzLayer {
    pub fn new(policy: AccessPolicy, metrics: Arc<Metrics>) -> Self {
        Self { policy, metrics }
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            policy: self.policy,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    policy: AccessPolicy,
    metrics: Arc<Metrics>,
}

impl<S> AuthzMiddleware<S> {
    fn evaluate(&self, req: &Request<Body>) -> Result<(), ApiError> {
        let Some(user) = req.extensions().get::<AuthUser>() else {
            warn!("authorization check without authentication");
            return Err(ApiError::Unauthorized(AuthFailure::MissingToken));
        };

        let fact = req.extensions().get::<OwnershipFact>().copied();
        if self.policy.needs_resource() && fact.is_none() {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "policy {} applied without a resource context",
                self.policy
            )));
        }

        let decision = self.policy.decide(user, fact);
        log_authz(
            user,
            self.policy,
            req.method().as_str(),
            req.uri().path(),
            fact,
            decision,
        );
        self.metrics.authz_decision(decision.as_str());

        if decision.is_granted() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
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
        if let Err(err) = self.evaluate(&req) {
            let response = err.into_response();
            return Box::pin(async move { Ok(response) });
        }
        Box::pin(self.inner.call(req))
    }
}
