//! Fixtures shared by unit tests.

use crate::cache::MemoryCache;
use crate::config::ServerConfig;
use crate::middleware::authz::Role;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::store::{MemoryStore, Password, User};
use std::sync::Arc;

pub const TEST_SECRET: &str = "unit-test-secret-that-is-long-enough!";

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.token.secret = TEST_SECRET.to_string();
    config.auth.basic.username = "operator".to_string();
    config.auth.basic.password = "letmein".to_string();
    config
}

/// State over a fresh in-memory store and cache.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::in_memory(config.rate_limit.mode());
    let state = AppState::from_parts(
        config,
        store.clone(),
        Arc::new(MemoryCache::new(1_000)),
        limiter,
    )
    .expect("test state");
    (state, store)
}

/// Insert an active user. Callers authenticate with an issued token, so no
/// credential is stored.
pub fn seed_user(store: &MemoryStore, username: &str, role: Role) -> User {
    store
        .seed_user(username, &format!("{username}@example.com"), Password::default(), role)
        .expect("seed user")
}
