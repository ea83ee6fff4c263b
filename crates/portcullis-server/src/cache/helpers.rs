//! Typed read-through helpers over a [`Cache`] backend.

use super::r#trait::{Cache, CacheError, CacheResult};
use crate::monitoring::Metrics;
use crate::store::User;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache key builder for consistent key generation.
pub struct CacheKeyBuilder {
    parts: Vec<String>,
}

impl CacheKeyBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            parts: vec![prefix.to_string()],
        }
    }

    pub fn add(mut self, part: impl ToString) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// Join parts with colons.
    pub fn build(self) -> String {
        self.parts.join(":")
    }
}

/// Common cache keys.
pub mod keys {
    use super::CacheKeyBuilder;

    pub const USER_PREFIX: &str = "user";

    /// Cache key for a user record.
    pub fn user(id: i64) -> String {
        CacheKeyBuilder::new(USER_PREFIX).add(id).build()
    }
}

/// Cache for one entity type, keyed by numeric id.
///
/// Owns serialization, key prefixing and the per-operation timeout. Backend
/// failures never reach the caller: reads degrade to a miss and writes to a
/// no-op, with a warning logged.
pub struct EntityCache<T> {
    backend: Arc<dyn Cache>,
    prefix: &'static str,
    ttl: Duration,
    op_timeout: Duration,
    metrics: Arc<Metrics>,
    _entity: PhantomData<fn() -> T>,
}

/// The user-record cache.
pub type UserCache = EntityCache<User>;

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            prefix: self.prefix,
            ttl: self.ttl,
            op_timeout: self.op_timeout,
            metrics: self.metrics.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> EntityCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        backend: Arc<dyn Cache>,
        prefix: &'static str,
        ttl: Duration,
        op_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            backend,
            prefix,
            ttl,
            op_timeout,
            metrics,
            _entity: PhantomData,
        }
    }

    pub fn key(&self, id: i64) -> String {
        CacheKeyBuilder::new(self.prefix).add(id).build()
    }

    pub fn backend(&self) -> &dyn Cache {
        self.backend.as_ref()
    }

    /// Cached snapshot for `id`, or `None` on miss, expiry or failure.
    pub async fn get(&self, id: i64) -> Option<T> {
        let key = self.key(id);
        let result = self
            .bounded(self.backend.get(&key))
            .await
            .and_then(|bytes| match bytes {
                Some(bytes) => serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|e| CacheError::Serialization(e.to_string())),
                None => Ok(None),
            });

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, treating as miss");
                None
            }
        };
        self.metrics.cache_lookup(value.is_some());
        debug!(key = %key, hit = value.is_some(), "entity cache lookup");
        value
    }

    /// Store a snapshot for `id` with the configured TTL.
    pub async fn set(&self, id: i64, value: &T) {
        let key = self.key(id);
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to serialize cache entry");
                return;
            }
        };
        if let Err(err) = self.bounded(self.backend.set(&key, bytes, self.ttl)).await {
            warn!(key = %key, error = %err, "cache write failed");
        }
    }

    /// Drop the entry for `id`. Safe to call when nothing is cached.
    pub async fn invalidate(&self, id: i64) {
        let key = self.key(id);
        if let Err(err) = self.bounded(self.backend.delete(&key)).await {
            warn!(key = %key, error = %err, "cache invalidation failed");
        }
    }

    /// Read-through: return the cached value or load, cache and return it.
    /// Loader errors propagate; cache errors do not.
    pub async fn get_or_load<E, F, Fut>(&self, id: i64, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(id).await {
            return Ok(hit);
        }
        let value = load().await?;
        self.set(id, &value).await;
        Ok(value)
    }

    async fn bounded<R>(&self, op: impl Future<Output = CacheResult<R>>) -> CacheResult<R> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.op_timeout)))
    }
}
