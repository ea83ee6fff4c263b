//! Shared application state.

use crate::cache::{self, Cache, UserCache};
use crate::config::ServerConfig;
use crate::middleware::auth::TokenService;
use crate::middleware::rate_limit::RateLimiter;
use crate::monitoring::Metrics;
use crate::store::{Storage, StoreResult, User};
use anyhow::Context;
use std::sync::Arc;

/// Collaborators shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn Storage>,
    pub users: UserCache,
    pub limiter: RateLimiter,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Build state from configuration. The cache backend and limiter store
    /// are chosen here.
    pub fn new(config: ServerConfig, store: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let backend = cache::build_backend(&config.cache).context("failed to build cache")?;
        let limiter = RateLimiter::from_settings(
            &config.rate_limit,
            config.cache.redis_url.as_deref(),
            config.cache.op_timeout(),
        )
        .context("failed to build rate limiter")?;
        Self::from_parts(config, store, backend, limiter)
    }

    /// Assemble state from explicit parts.
    pub fn from_parts(
        config: ServerConfig,
        store: Arc<dyn Storage>,
        cache_backend: Arc<dyn Cache>,
        limiter: RateLimiter,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
        let users = UserCache::new(
            cache_backend,
            cache::keys::USER_PREFIX,
            config.cache.ttl(),
            config.cache.op_timeout(),
            metrics.clone(),
        );

        Ok(Self {
            tokens: Arc::new(TokenService::from_config(&config.auth.token)),
            config: Arc::new(config),
            store,
            users,
            limiter,
            metrics,
        })
    }

    /// Cache-backed user lookup.
    pub async fn user_by_id(&self, id: i64) -> StoreResult<User> {
        self.users
            .get_or_load(id, || self.store.find_user_by_id(id))
            .await
    }

    /// Drop the cached snapshot for a user whose state changed.
    pub async fn invalidate_user(&self, id: i64) {
        self.users.invalidate(id).await;
    }
}
