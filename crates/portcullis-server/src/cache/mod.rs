//! Caching layer for the server.
//!
//! A byte-level [`Cache`] backend is chosen once at startup: Redis when a
//! connection URL is configured, process memory otherwise, or a no-op when
//! caching is disabled. Callers go through the typed [`EntityCache`].

pub mod helpers;
pub mod memory;
pub mod noop;
pub mod redis;
pub mod r#trait;

pub use helpers::{keys, CacheKeyBuilder, EntityCache, UserCache};
pub use memory::MemoryCache;
pub use noop::NoopCache;
pub use r#trait::{Cache, CacheError, CacheResult, CacheStats};
pub use self::redis::{RedisCache, RedisConnector};

use crate::config::CacheConfig;
use std::sync::Arc;
use tracing::info;

/// Key namespace for everything this service writes to Redis.
pub const REDIS_PREFIX: &str = "portcullis";

/// Select the backend described by `config`.
pub fn build_backend(config: &CacheConfig) -> CacheResult<Arc<dyn Cache>> {
    let backend: Arc<dyn Cache> = match (config.enabled, config.redis_url.as_deref()) {
        (false, _) => Arc::new(NoopCache::new()),
        (true, Some(url)) => Arc::new(RedisCache::new(url, REDIS_PREFIX)?),
        (true, None) => Arc::new(MemoryCache::new(config.max_entries)),
    };
    info!(backend = backend.backend(), "cache backend selected");
    Ok(backend)
}
