//! Limiter facade combining the configured mode with a store.

use super::store::{InMemoryStore, RateLimitStore, RedisStore};
use super::types::{Admission, RateLimitMode};
use crate::cache::REDIS_PREFIX;
use crate::config::RateLimitSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Fixed-window rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    mode: RateLimitMode,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(mode: RateLimitMode, store: Arc<dyn RateLimitStore>) -> Self {
        Self { mode, store }
    }

    pub fn in_memory(mode: RateLimitMode) -> Self {
        Self::new(mode, Arc::new(InMemoryStore::new()))
    }

    /// Build from settings; windows live in Redis when a URL is given, with
    /// each store call bounded by `op_timeout`.
    pub fn from_settings(
        settings: &RateLimitSettings,
        redis_url: Option<&str>,
        op_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mode = settings.mode();
        let store: Arc<dyn RateLimitStore> = match redis_url {
            Some(url) if mode != RateLimitMode::Disabled => {
                Arc::new(RedisStore::new(url, REDIS_PREFIX, op_timeout)?)
            }
            _ => Arc::new(InMemoryStore::new()),
        };
        info!(mode = ?mode, store = store.backend(), "rate limiter configured");
        Ok(Self::new(mode, store))
    }

    pub fn mode(&self) -> RateLimitMode {
        self.mode
    }

    /// Decide whether `key` may proceed at `now`.
    ///
    /// Returns `None` when limiting is disabled. Store failures admit the
    /// request.
    pub async fn allow(&self, key: &str, now: Instant) -> Option<Admission> {
        let RateLimitMode::FixedWindow(config) = self.mode else {
            return None;
        };

        match self.store.hit(key, &config, now).await {
            Ok(admission) => Some(admission),
            Err(err) => {
                warn!(client = key, error = %err, "rate limit store failed, admitting request");
                Some(Admission::allowed(config.limit, config.limit))
            }
        }
    }

    /// Convenience for callers that only need the verdict and wait time.
    pub async fn check(&self, key: &str, now: Instant) -> (bool, Option<Duration>) {
        match self.allow(key, now).await {
            Some(admission) => (admission.allowed, admission.retry_after),
            None => (true, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::rate_limit::{RateLimitConfig, RateLimitError};
    use async_trait::async_trait;

    fn five_per_five_seconds() -> RateLimiter {
        RateLimiter::in_memory(RateLimitMode::FixedWindow(RateLimitConfig::new(
            5,
            Duration::from_secs(5),
        )))
    }

    #[tokio::test]
    async fn test_sixth_request_rejected_then_window_reopens() {
        let limiter = five_per_five_seconds();
        let t0 = Instant::now();

        for _ in 0..5 {
            assert_eq!(limiter.check("client", t0).await, (true, None));
        }

        let (allowed, retry_after) = limiter.check("client", t0).await;
        assert!(!allowed);
        assert_eq!(retry_after, Some(Duration::from_secs(5)));

        let later = t0 + Duration::from_millis(5100);
        assert_eq!(limiter.check("client", later).await, (true, None));
    }

    #[tokio::test]
    async fn test_window_edge_burst_is_accepted() {
        let limiter = five_per_five_seconds();
        let t0 = Instant::now();
        let edge = t0 + Duration::from_millis(4999);

        assert!(limiter.check("client", t0).await.0);
        for _ in 0..4 {
            assert!(limiter.check("client", edge).await.0);
        }
        // Next window opens one millisecond later: five more fit.
        let next = t0 + Duration::from_secs(5);
        for _ in 0..5 {
            assert!(limiter.check("client", next).await.0);
        }
        assert!(!limiter.check("client", next).await.0);
    }

    #[tokio::test]
    async fn test_disabled_mode_always_admits() {
        let limiter = RateLimiter::in_memory(RateLimitMode::Disabled);
        let now = Instant::now();
        for _ in 0..1_000 {
            assert!(limiter.allow("client", now).await.is_none());
        }
        assert_eq!(limiter.check("client", now).await, (true, None));
    }

    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn hit(
            &self,
            _key: &str,
            _config: &RateLimitConfig,
            _now: Instant,
        ) -> Result<Admission, RateLimitError> {
            Err(RateLimitError::Backend("connection refused".into()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let limiter = RateLimiter::new(
            RateLimitMode::FixedWindow(RateLimitConfig::new(1, Duration::from_secs(60))),
            Arc::new(BrokenStore),
        );
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check("client", now).await.0);
        }
    }

    #[tokio::test]
    async fn test_stalled_redis_admits_within_budget() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("redis://{}/", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = RateLimitSettings::default();
        let limiter =
            RateLimiter::from_settings(&settings, Some(&url), Duration::from_millis(100)).unwrap();

        let verdict = tokio::time::timeout(
            Duration::from_secs(2),
            limiter.check("client", Instant::now()),
        )
        .await
        .expect("limiter must not wait on a stalled store");
        assert_eq!(verdict, (true, None));
        server.abort();
    }
}
