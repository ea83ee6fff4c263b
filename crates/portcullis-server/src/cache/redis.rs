//! Redis cache implementation.

use super::r#trait::{Cache, CacheError, CacheResult, CacheStats};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Lazily established multiplexed connection shared by every caller.
///
/// A failed connect leaves the cell empty, so the next operation retries.
pub struct RedisConnector {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisConnector {
    pub fn new(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    pub async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.connection
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await
            .cloned()
    }
}

/// Redis cache implementation.
pub struct RedisCache {
    connector: RedisConnector,
    prefix: String,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCache {
    /// Create a new Redis cache with the given URL and key prefix.
    pub fn new(url: &str, prefix: &str) -> CacheResult<Self> {
        Ok(Self {
            connector: RedisConnector::new(url)?,
            prefix: prefix.to_string(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn conn(&self) -> CacheResult<MultiplexedConnection> {
        self.connector
            .connection()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(key, hit = value.is_some(), "redis cache get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<_, i64>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}
