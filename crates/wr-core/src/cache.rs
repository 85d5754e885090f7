//! Drill-down result cache using moka
//!
//! One cache per disclosure surface, keyed by the surface's query key.
//! Entries are advisory: a refresh always goes to the backend.

use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use wr_model::FlatProblemRow;

/// Rows resolved for one query
pub type Rows = Arc<Vec<FlatProblemRow>>;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Per-surface result cache
#[derive(Debug, Clone)]
pub struct RowCache<K>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    inner: Cache<K, Rows>,
}

impl<K> RowCache<K>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get cached rows
    #[inline]
    pub async fn get(&self, key: &K) -> Option<Rows> {
        self.inner.get(key).await
    }

    /// Get rows or resolve them
    ///
    /// Concurrent calls for the same key share one resolution. Failures are
    /// not cached.
    ///
    /// # Errors
    /// Whatever `resolve` fails with
    pub async fn try_get_or_resolve<E, Fut>(&self, key: K, resolve: Fut) -> Result<Rows, E>
    where
        E: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<FlatProblemRow>, E>>,
    {
        self.inner
            .try_get_with(key, async move { resolve.await.map(Arc::new) })
            .await
            .map_err(|e: Arc<E>| E::clone(&e))
    }

    /// Invalidate one entry
    #[inline]
    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache holds `key`
    #[inline]
    pub async fn contains(&self, key: &K) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn resolves_once_per_key() {
        let cache: RowCache<String> = RowCache::new(10);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let rows = cache
                .try_get_or_resolve("leak".to_string(), async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(Vec::new())
                })
                .await
                .unwrap();
            assert!(rows.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&"leak".to_string()).await);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache: RowCache<u32> = RowCache::new(10);

        let err = cache
            .try_get_or_resolve(1, async { Err::<Vec<FlatProblemRow>, _>("down".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err, "down");
        assert!(!cache.contains(&1).await);

        cache
            .try_get_or_resolve(1, async { Ok::<_, String>(Vec::new()) })
            .await
            .unwrap();
        assert!(cache.contains(&1).await);
    }

    #[tokio::test]
    async fn invalidate_all_forgets_entries() {
        let cache: RowCache<u32> = RowCache::with_ttl(10, Duration::from_secs(60));
        cache
            .try_get_or_resolve(7, async { Ok::<_, String>(Vec::new()) })
            .await
            .unwrap();
        cache.invalidate_all();
        assert!(cache.get(&7).await.is_none());
    }
}
