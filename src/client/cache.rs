use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::store::ViewCounts;

/// Default time a fetched count is considered fresh
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    views: u64,
    updated_at: Instant,
    invalidated: bool,
}

/// Per-slug cache of view counts shared by counters on one page.
///
/// Concurrent reads of the same slug share a single fetch. Cloning hands out
/// another handle to the same cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    stale_time: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                stale_time,
                entries: Mutex::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Return a fresh cached count or run `fetcher` to get one.
    ///
    /// Callers asking for the same slug while a fetch is running wait for it
    /// and reuse its result. Failed fetches leave the previous entry alone.
    pub async fn fetch<F, Fut>(&self, slug: &str, fetcher: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        if let Some(views) = self.fresh(slug) {
            return Ok(views);
        }

        let slot = self.inflight_slot(slug);
        let _guard = slot.lock.lock().await;

        if let Some(views) = self.fresh(slug) {
            return Ok(views);
        }

        let views = fetcher().await?;
        self.set(slug, views);
        Ok(views)
    }

    /// Last known count, fresh or not
    pub fn peek(&self, slug: &str) -> Option<u64> {
        self.entries().get(slug).map(|entry| entry.views)
    }

    /// Store a count, e.g. the result of an increment
    pub fn set(&self, slug: &str, views: u64) {
        self.entries().insert(
            slug.to_string(),
            CacheEntry {
                views,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Seed the cache from a bulk listing
    pub fn prime(&self, counts: &ViewCounts) {
        for (slug, views) in counts {
            self.set(slug, *views);
        }
    }

    /// Force the next [`fetch`](Self::fetch) for `slug` to go to the API
    pub fn invalidate(&self, slug: &str) {
        if let Some(entry) = self.entries().get_mut(slug) {
            entry.invalidated = true;
        }
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn fresh(&self, slug: &str) -> Option<u64> {
        let stale_time = self.inner.stale_time;
        self.entries()
            .get(slug)
            .filter(|entry| !entry.invalidated && entry.updated_at.elapsed() < stale_time)
            .map(|entry| entry.views)
    }

    fn inflight_slot<'a>(&'a self, slug: &'a str) -> InflightSlot<'a> {
        let mut inflight = self
            .inner
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        InflightSlot {
            cache: &self.inner,
            slug,
            lock: inflight.entry(slug.to_string()).or_default().clone(),
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inner
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle on a slug's fetch lock. The last handle to go away removes the
/// lock from the in-flight map.
struct InflightSlot<'a> {
    cache: &'a CacheInner,
    slug: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self
            .cache
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // one reference in the map plus this one
        if Arc::strong_count(&self.lock) == 2 {
            inflight.remove(self.slug);
        }
    }
}
