//! Bearer authentication layer.

use super::types::{AuthFailure, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Verifies the bearer token, loads the caller's profile and stores an
/// [`AuthUser`] in the request extensions.
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

/// Authentication middleware service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match authenticate(&state, req.headers(), Utc::now()).await {
                Ok(user) => {
                    debug!(user_id = user.id, "request authenticated");
                    req.extensions_mut().insert(user);
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

/// Resolve the caller behind the `Authorization: Bearer` header.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<AuthUser, ApiError> {
    let reject = |reason: AuthFailure| {
        state.metrics.auth_failure(reason);
        ApiError::Unauthorized(reason)
    };

    let token = bearer_token(headers).ok_or_else(|| reject(AuthFailure::MissingToken))?;

    let user_id = state
        .tokens
        .verify(token, now)
        .map_err(|e| reject(e.into()))?;

    match state.user_by_id(user_id).await {
        Ok(user) if user.is_active => Ok(AuthUser::from_profile(user)),
        Ok(_) | Err(StoreError::NotFound(_)) => Err(reject(AuthFailure::UnknownSubject)),
        Err(err) => Err(err.into()),
    }
}

/// Credentials of a `Bearer` authorization header. The scheme name is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim_start()
        .split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::authz::Role;
    use crate::test_support::{seed_user, test_state};
    use axum::http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&bearer("abc")), Some("abc"));
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&basic), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&empty), None);
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc", "BEARER abc", "BeArEr  abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
            assert_eq!(bearer_token(&headers), Some("abc"), "{value}");
        }

        let mut glued = HeaderMap::new();
        glued.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearerabc"));
        assert_eq!(bearer_token(&glued), None);
    }

    #[tokio::test]
    async fn test_authenticate_active_user() {
        let (state, store) = test_state();
        let user = seed_user(&store, "ada", Role::Moderator);
        let now = Utc::now();
        let token = state.tokens.issue(user.id, now).unwrap();

        let auth = authenticate(&state, &bearer(&token), now).await.unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.role, Role::Moderator);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (state, _) = test_state();
        let err = authenticate(&state, &HeaderMap::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(AuthFailure::MissingToken)));
    }

    #[tokio::test]
    async fn test_unknown_subject() {
        let (state, _) = test_state();
        let now = Utc::now();
        let token = state.tokens.issue(999, now).unwrap();
        let err = authenticate(&state, &bearer(&token), now).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(AuthFailure::UnknownSubject)));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (state, store) = test_state();
        let user = seed_user(&store, "ada", Role::User);
        let issued = Utc::now();
        let token = state.tokens.issue(user.id, issued).unwrap();
        let later = issued + chrono::Duration::seconds(state.tokens.ttl_secs());

        let err = authenticate(&state, &bearer(&token), later).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(AuthFailure::Expired)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal() {
        let (state, store) = test_state();
        let user = seed_user(&store, "ada", Role::User);
        let now = Utc::now();
        let token = state.tokens.issue(user.id, now).unwrap();
        store.set_unavailable(true);

        let err = authenticate(&state, &bearer(&token), now).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
