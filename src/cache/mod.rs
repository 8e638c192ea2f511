// src/cache/mod.rs
//! Two-tier key/value cache with TTL and tag-based invalidation.
//!
//! Reads go local tier first, then the shared Redis tier. The shared tier
//! is optional and best-effort: when Redis is unreachable the cache keeps
//! working on the local layer alone.

pub mod local;
pub mod shared;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use local::LocalCache;
use shared::SharedCache;

/// TTL on shared-tier hits replayed into the local tier. The shared entry's
/// remaining TTL is unknown at that point, so the replay is kept short.
const REPLAY_TTL: Duration = Duration::from_secs(60);

/// Write options: how long the entry lives and which invalidation tags it
/// is written under.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            tags: Vec::new(),
        }
    }
}

/// The cache facade injected into the pipeline. Construct one per process
/// (or per test) and share it by reference; there are no ambient globals.
pub struct TieredCache {
    local: LocalCache,
    shared: Option<SharedCache>,
}

impl TieredCache {
    /// A cache with only the in-process layer. Used in tests and in
    /// deployments without Redis.
    pub fn local_only() -> Self {
        Self {
            local: LocalCache::new(),
            shared: None,
        }
    }

    /// Connect the shared tier when a Redis URL is configured. Connection
    /// failure degrades to local-only with a warning, never an error.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let shared = match redis_url {
            Some(url) => match SharedCache::connect(url).await {
                Ok(shared) => {
                    info!("Cache: shared Redis tier connected");
                    Some(shared)
                }
                Err(e) => {
                    warn!("Cache: Redis unavailable, running local-only: {:#}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            local: LocalCache::new(),
            shared,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(value) = self.local.get(key) {
            debug!("Cache hit (local): {}", key);
            return serde_json::from_value(value).ok();
        }

        if let Some(shared) = &self.shared {
            match shared.get(key).await {
                Ok(Some(value)) => {
                    debug!("Cache hit (shared): {}", key);
                    self.local.set(key, value.clone(), REPLAY_TTL, &[]);
                    return serde_json::from_value(value).ok();
                }
                Ok(None) => {}
                Err(e) => warn!("Cache: shared-tier read failed for {}: {:#}", key, e),
            }
        }

        None
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, opts: CacheOptions) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Cache: refusing unserializable value for {}: {}", key, e);
                return;
            }
        };

        self.local.set(key, json.clone(), opts.ttl, &opts.tags);

        if let Some(shared) = &self.shared {
            if let Err(e) = shared.set(key, &json, opts.ttl, &opts.tags).await {
                warn!("Cache: shared-tier write failed for {}: {:#}", key, e);
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        self.local.remove(key);
        if let Some(shared) = &self.shared {
            if let Err(e) = shared.delete(key).await {
                warn!("Cache: shared-tier delete failed for {}: {:#}", key, e);
            }
        }
    }

    /// Remove every key written with the given tag, in both tiers.
    pub async fn invalidate_by_tag(&self, tag: &str) {
        self.local.invalidate_by_tag(tag);
        if let Some(shared) = &self.shared {
            if let Err(e) = shared.invalidate_by_tag(tag).await {
                warn!("Cache: shared-tier invalidation failed for {}: {:#}", tag, e);
            }
        }
    }

    /// Read-through helper: return the cached value or run the factory and
    /// cache its result. Factory errors pass through uncached.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        opts: CacheOptions,
        factory: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, &value, opts).await;
        Ok(value)
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = TieredCache::local_only();
        cache
            .set("greeting", &"hello".to_string(), CacheOptions::default())
            .await;

        let value: Option<String> = cache.get("greeting").await;
        assert_eq!(value, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_returned() {
        let cache = TieredCache::local_only();
        cache
            .set(
                "ephemeral",
                &42u32,
                CacheOptions::ttl(Duration::from_secs(0)),
            )
            .await;

        let value: Option<u32> = cache.get("ephemeral").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_overwrites_existing_entry() {
        let cache = TieredCache::local_only();
        cache.set("key", &1u32, CacheOptions::default()).await;
        cache
            .set("key", &2u32, CacheOptions::ttl(Duration::from_secs(0)))
            .await;

        let value: Option<u32> = cache.get("key").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = TieredCache::local_only();
        cache
            .set("short", &1u32, CacheOptions::ttl(Duration::from_millis(5)))
            .await;

        tokio::time::sleep(Duration::from_millis(20)).await;

        let value: Option<u32> = cache.get("short").await;
        assert_eq!(value, None);
        assert_eq!(cache.local_len(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_by_tag_removes_exactly_tagged_keys() {
        let cache = TieredCache::local_only();
        cache
            .set(
                "a",
                &1u32,
                CacheOptions::default().with_tag("scores"),
            )
            .await;
        cache
            .set(
                "b",
                &2u32,
                CacheOptions::default().with_tag("scores"),
            )
            .await;
        cache
            .set("c", &3u32, CacheOptions::default().with_tag("other"))
            .await;
        cache.set("d", &4u32, CacheOptions::default()).await;

        cache.invalidate_by_tag("scores").await;

        assert_eq!(cache.get::<u32>("a").await, None);
        assert_eq!(cache.get::<u32>("b").await, None);
        assert_eq!(cache.get::<u32>("c").await, Some(3));
        assert_eq!(cache.get::<u32>("d").await, Some(4));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_tag_is_noop() {
        let cache = TieredCache::local_only();
        cache.set("a", &1u32, CacheOptions::default()).await;
        cache.invalidate_by_tag("nothing-here").await;
        assert_eq!(cache.get::<u32>("a").await, Some(1));
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let cache = TieredCache::local_only();
        cache.set("a", &1u32, CacheOptions::default()).await;
        cache.delete("a").await;
        assert_eq!(cache.get::<u32>("a").await, None);
    }

    #[tokio::test]
    async fn test_get_or_set_runs_factory_once() {
        let cache = TieredCache::local_only();

        let first: Result<u32, &str> = cache
            .get_or_set("computed", CacheOptions::default(), || async { Ok(7) })
            .await;
        assert_eq!(first, Ok(7));

        // Second call must come from the cache, not the factory.
        let second: Result<u32, &str> = cache
            .get_or_set("computed", CacheOptions::default(), || async {
                Err("factory should not run")
            })
            .await;
        assert_eq!(second, Ok(7));
    }

    #[tokio::test]
    async fn test_factory_error_is_not_cached() {
        let cache = TieredCache::local_only();

        let failed: Result<u32, String> = cache
            .get_or_set("volatile", CacheOptions::default(), || async {
                Err("oracle down".to_string())
            })
            .await;
        assert!(failed.is_err());

        let retried: Result<u32, String> = cache
            .get_or_set("volatile", CacheOptions::default(), || async { Ok(9) })
            .await;
        assert_eq!(retried, Ok(9));
    }
}
