//! Rate limit storage backends.

use super::types::{Admission, RateLimitConfig, Window};
use crate::cache::RedisConnector;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Store failure. The limiter admits the request when it sees one.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit store unavailable: {0}")]
    Backend(String),

    #[error("rate limit store timed out after {0:?}")]
    Timeout(Duration),
}

/// Atomic per-key increment-and-check.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> Result<Admission, RateLimitError>;

    fn backend(&self) -> &'static str;
}

/// In-process windows. The `DashMap` entry guard holds the shard lock for the
/// whole check, so concurrent hits on one key serialize.
#[derive(Default)]
pub struct InMemoryStore {
    windows: DashMap<String, Window>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current window for `key`, if one was ever created.
    pub fn window(&self, key: &str) -> Option<Window> {
        self.windows.get(key).map(|entry| *entry.value())
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn hit(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> Result<Admission, RateLimitError> {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(now));
        Ok(entry.value_mut().admit(config, now))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Increments the window counter and arms its expiry in one server-side
/// step. Returns the post-increment count and the remaining TTL in ms.
const FIXED_WINDOW_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

/// Redis-backed windows shared by every process using the same server.
///
/// Window boundaries follow the Redis server clock (key expiry), so the
/// caller's `now` is not consulted.
///
/// Connecting and running the script share one `op_timeout` budget.
pub struct RedisStore {
    connector: RedisConnector,
    prefix: String,
    script: redis::Script,
    op_timeout: Duration,
}

impl RedisStore {
    pub fn new(redis_url: &str, prefix: &str, op_timeout: Duration) -> Result<Self, RateLimitError> {
        Ok(Self {
            connector: RedisConnector::new(redis_url)
                .map_err(|e| RateLimitError::Backend(e.to_string()))?,
            prefix: prefix.to_string(),
            script: redis::Script::new(FIXED_WINDOW_SCRIPT),
            op_timeout,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:ratelimit:{}", self.prefix, key)
    }

    async fn run_script(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<Admission, RateLimitError> {
        let mut conn = self
            .connector
            .connection()
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let window_ms = u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX).max(1);
        let (count, ttl_ms): (i64, i64) = self
            .script
            .key(self.key(key))
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let limit = i64::from(config.limit);
        if count <= limit {
            let remaining = u32::try_from(limit - count).unwrap_or(0);
            Ok(Admission::allowed(config.limit, remaining))
        } else {
            let retry = Duration::from_millis(u64::try_from(ttl_ms).unwrap_or(0));
            Ok(Admission::rejected(config.limit, retry))
        }
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn hit(
        &self,
        key: &str,
        config: &RateLimitConfig,
        _now: Instant,
    ) -> Result<Admission, RateLimitError> {
        tokio::time::timeout(self.op_timeout, self.run_script(key, config))
            .await
            .unwrap_or(Err(RateLimitError::Timeout(self.op_timeout)))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
