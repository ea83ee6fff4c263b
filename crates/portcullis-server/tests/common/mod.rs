//! Common utilities for router-level tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use portcullis_server::cache::MemoryCache;
use portcullis_server::config::ServerConfig;
use portcullis_server::middleware::rate_limit::{RateLimitMode, RateLimiter};
use portcullis_server::middleware::Role;
use portcullis_server::routes::create_router;
use portcullis_server::store::{MemoryStore, Password, User};
use portcullis_server::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-with-plenty-of-bytes";

/// `operator:letmein`
pub const OPERATOR_BASIC: &str = "Basic b3BlcmF0b3I6bGV0bWVpbg==";

/// `operator:wrong`
pub const WRONG_BASIC: &str = "Basic b3BlcmF0b3I6d3Jvbmc=";

/// A fully wired router over an in-memory store.
pub struct TestContext {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

/// A decoded response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.token.secret = SECRET.to_string();
    config.auth.basic.username = "operator".to_string();
    config.auth.basic.password = "letmein".to_string();
    // Tests tell clients apart by X-Forwarded-For.
    config.rate_limit.trust_forwarded_headers = true;
    config
}

impl TestContext {
    /// Router with rate limiting disabled.
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitMode::Disabled)
    }

    pub fn with_rate_limit(mode: RateLimitMode) -> Self {
        Self::with_config(test_config(), mode)
    }

    pub fn with_config(config: ServerConfig, mode: RateLimitMode) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::from_parts(
            config,
            store.clone(),
            Arc::new(MemoryCache::new(1_000)),
            RateLimiter::in_memory(mode),
        )
        .expect("Failed to build state");

        Self {
            router: create_router(state.clone()),
            state,
            store,
        }
    }

    /// Seed an active user and return it with a bearer token issued now.
    pub fn user(&self, name: &str, role: Role) -> (User, String) {
        let user = self
            .store
            .seed_user(name, &format!("{name}@example.com"), Password::default(), role)
            .expect("Failed to seed user");
        let token = self.token_for(user.id, Utc::now());
        (user, token)
    }

    pub fn token_for(&self, user_id: i64, issued_at: DateTime<Utc>) -> String {
        self.state
            .tokens
            .issue(user_id, issued_at)
            .expect("Failed to issue token")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        self.send(request(method, uri, token, Some(body))).await
    }

    /// Create a post as the holder of `token` and return its id.
    pub async fn create_post(&self, token: &str, title: &str) -> i64 {
        let response = self
            .json(
                Method::POST,
                "/v1/posts",
                Some(token),
                serde_json::json!({ "title": title, "content": "body", "tags": ["rust"] }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["id"].as_i64().expect("post id")
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request")
}
