//! Robots.txt caching implementation
//!
//! This module provides a per-site cache for resolved policies. Concurrent
//! lookups of one site share a single retrieval, and entries expire after a
//! configurable TTL (24 hours by default). The number of sites tracked is
//! bounded; the least recently used site is evicted first.

use crate::robots::RobotsPolicy;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Default lifetime of a cached policy
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Default number of sites tracked at once
pub const DEFAULT_MAX_SITES: usize = 10_000;

/// Cached robots.txt data for a site
///
/// This structure stores a resolved policy along with the timestamp
/// when it was fetched, allowing for cache expiration checks.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The resolved policy
    pub policy: Arc<RobotsPolicy>,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps a policy fetched just now
    pub fn new(policy: Arc<RobotsPolicy>) -> Self {
        Self {
            policy,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    /// Returns how long ago the robots.txt was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// One site's slot. Initialised at most once; replaced wholesale on expiry.
type Slot = Arc<OnceCell<CachedRobots>>;

/// Concurrency-safe per-site policy cache
///
/// Keys are site origins (see [`crate::url::site_key`]). A lookup that misses
/// runs the supplied resolver; lookups of the same key that arrive meanwhile
/// wait for that resolver instead of starting their own. Failed or abandoned
/// resolutions leave nothing behind.
#[derive(Debug)]
pub struct PolicyCache {
    entries: Mutex<LruCache<String, Slot>>,
    ttl: Duration,
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

impl PolicyCache {
    /// Creates a cache tracking up to [`DEFAULT_MAX_SITES`] sites
    pub fn new(ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_MAX_SITES).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(ttl, capacity)
    }

    /// Creates a cache tracking up to `max_sites` sites
    ///
    /// Evicting a site whose retrieval is still in flight lets a later lookup
    /// start a second one; size `max_sites` above the crawl's working set.
    pub fn with_capacity(ttl: Duration, max_sites: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_sites)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    /// Returns the cached policy for `key`, resolving it on a miss
    ///
    /// # Arguments
    ///
    /// * `key` - Site origin
    /// * `resolve` - Produces the policy; only called when no fresh entry
    ///   exists and no other caller is already resolving this key
    ///
    /// # Returns
    ///
    /// * `Ok(policy)` - Cached or freshly resolved policy
    /// * `Err(E)` - The resolver failed; nothing was cached
    pub async fn get_or_resolve<F, Fut, E>(
        &self,
        key: &str,
        resolve: F,
    ) -> Result<Arc<RobotsPolicy>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RobotsPolicy, E>>,
    {
        // Dropped on every exit, including cancellation
        let guard = SlotGuard {
            cache: self,
            key,
            slot: self.slot(key),
        };
        let cached = guard
            .slot
            .get_or_try_init(|| async move {
                resolve()
                    .await
                    .map(|policy| CachedRobots::new(Arc::new(policy)))
            })
            .await?;
        Ok(Arc::clone(&cached.policy))
    }

    /// Returns a fresh entry for `key` without resolving
    pub fn get(&self, key: &str) -> Option<CachedRobots> {
        self.lock()
            .peek(key)
            .and_then(|slot| slot.get())
            .filter(|cached| !cached.is_stale(self.ttl))
            .cloned()
    }

    /// Stores an entry directly, replacing whatever was there
    pub fn insert(&self, key: &str, cached: CachedRobots) {
        let slot = Arc::new(OnceCell::new_with(Some(cached)));
        self.lock().put(key.to_string(), slot);
    }

    /// Drops the entry for `key`
    ///
    /// Returns true if an entry was dropped. A key whose retrieval is still in
    /// flight is left alone, so no second retrieval can start beside it.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.lock();
        let resolved = entries.peek(key).is_some_and(|slot| slot.initialized());
        if !resolved {
            return false;
        }
        entries.pop(key).is_some()
    }

    /// Drops every entry, including ones still being resolved
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of populated entries, fresh or stale
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the slot for `key`, swapping in an empty one if the entry expired
    fn slot(&self, key: &str) -> Slot {
        let mut entries = self.lock();
        if let Some(slot) = entries.get_mut(key) {
            if slot.get().is_some_and(|cached| cached.is_stale(self.ttl)) {
                tracing::debug!("Cached robots.txt for {} expired", key);
                *slot = Slot::default();
            }
            return Arc::clone(slot);
        }

        let slot = Slot::default();
        if let Some((evicted, _)) = entries.push(key.to_string(), Arc::clone(&slot)) {
            tracing::trace!("Evicted cached robots.txt for {}", evicted);
        }
        slot
    }

    /// Removes `slot` if it is still empty and nobody else holds it
    ///
    /// Slots are only cloned under the lock, so a count of two (the map and
    /// the caller) means no other lookup is waiting on it.
    fn discard_if_unused(&self, key: &str, slot: &Slot) {
        let mut entries = self.lock();
        let unused = entries.peek(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(slot) == 2
        });
        if unused {
            entries.pop(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a lookup's slot and cleans it up if the lookup never filled it
struct SlotGuard<'a> {
    cache: &'a PolicyCache,
    key: &'a str,
    slot: Slot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.slot.initialized() {
            self.cache.discard_if_unused(self.key, &self.slot);
        }
    }
}
