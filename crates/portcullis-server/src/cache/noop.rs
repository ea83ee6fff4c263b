//! Cache backend used when caching is disabled.

use super::r#trait::{Cache, CacheResult, CacheStats};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Stores nothing; every read is a miss.
#[derive(Debug, Default)]
pub struct NoopCache {
    misses: AtomicU64,
}

impl NoopCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "noop"
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_misses() {
        let cache = NoopCache::new();
        cache.set("k", vec![1], Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.stats().await.misses, 1);
    }
}
