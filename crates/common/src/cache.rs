//! Rendered-page cache.
//!
//! Caches whole rendered pages under an explicit key for a fixed TTL. Two
//! backends are available:
//!
//! - [`MemoryPageCache`]: in-process, backed by `moka`
//! - [`RedisPageCache`]: shared between processes, backed by Redis
//!
//! # Example
//!
//! ```ignore
//! use yatube_common::cache::{MemoryPageCache, PageCache};
//! use std::time::Duration;
//!
//! let cache = MemoryPageCache::new(Duration::from_secs(20));
//! if cache.get("index_page:anon:1").await?.is_none() {
//!     cache.insert("index_page:anon:1", render()).await?;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use moka::future::Cache;
use tracing::{debug, info};

use crate::{AppError, AppResult};

/// Upper bound on the number of pages kept in the in-process cache.
const MEMORY_CACHE_CAPACITY: u64 = 10_000;

/// Cache for rendered page bodies.
#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    /// Get a cached page body.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a page body; it expires after the cache's TTL.
    async fn insert(&self, key: &str, body: String) -> AppResult<()>;

    /// Drop every cached page.
    async fn clear(&self) -> AppResult<()>;
}

/// Shared handle to a page cache.
pub type SharedPageCache = Arc<dyn PageCache>;

/// In-process page cache.
#[derive(Clone)]
pub struct MemoryPageCache {
    cache: Cache<String, String>,
}

impl MemoryPageCache {
    /// Create a new in-process cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MEMORY_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let hit = self.cache.get(key).await;
        debug!(key = %key, hit = hit.is_some(), "Page cache lookup");
        Ok(hit)
    }

    async fn insert(&self, key: &str, body: String) -> AppResult<()> {
        self.cache.insert(key.to_string(), body).await;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        info!("Cleared in-process page cache");
        Ok(())
    }
}

/// Redis-backed page cache.
///
/// Keys are namespaced by a generation counter; clearing the cache bumps the
/// counter so older entries are never read again and expire on their own.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl: Duration,
}

impl RedisPageCache {
    /// Create a new Redis page cache.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            ttl,
        }
    }

    fn generation_key(&self) -> String {
        format!("{}:page_cache:generation", self.prefix)
    }

    fn entry_key(&self, generation: i64, key: &str) -> String {
        format!("{}:page_cache:{generation}:{key}", self.prefix)
    }

    async fn generation(&self) -> AppResult<i64> {
        let generation: Option<i64> = self
            .redis
            .get(self.generation_key())
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(generation.unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let generation = self.generation().await?;
        let hit: Option<String> = self
            .redis
            .get(self.entry_key(generation, key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        debug!(key = %key, hit = hit.is_some(), "Page cache lookup");
        Ok(hit)
    }

    async fn insert(&self, key: &str, body: String) -> AppResult<()> {
        let generation = self.generation().await?;
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        self.redis
            .set::<(), _, _>(
                self.entry_key(generation, key),
                body,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn clear(&self) -> AppResult<()> {
        let generation: i64 = self
            .redis
            .incr(self.generation_key())
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        info!(generation, "Cleared Redis page cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_hit_and_miss() {
        let cache = MemoryPageCache::new(Duration::from_secs(20));

        assert!(cache.get("index_page:anon:1").await.unwrap().is_none());

        cache
            .insert("index_page:anon:1", "<html>1</html>".to_string())
            .await
            .unwrap();

        assert_eq!(
            cache.get("index_page:anon:1").await.unwrap().as_deref(),
            Some("<html>1</html>")
        );
        assert!(cache.get("index_page:anon:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = MemoryPageCache::new(Duration::from_secs(20));
        cache.insert("k", "v".to_string()).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_expires() {
        let cache = MemoryPageCache::new(Duration::from_millis(50));
        cache.insert("k", "v".to_string()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redis_keys_are_namespaced() {
        let config = fred::types::config::Config::from_url("redis://localhost:6379").unwrap();
        let client = Arc::new(RedisClient::new(config, None, None, None));
        let cache = RedisPageCache::new(client, "yatube", Duration::from_secs(20));

        assert_eq!(cache.generation_key(), "yatube:page_cache:generation");
        assert_eq!(
            cache.entry_key(3, "index_page:anon:1"),
            "yatube:page_cache:3:index_page:anon:1"
        );
    }
}
