//! Representation cache storage.
//!
//! Values are stored without expiry; the LRU capacity is the only eviction.

use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use uuid::Uuid;

use crate::application::serializers::Representation;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Key-value store for cached representations.
///
/// Methods are synchronous and must never be called while holding state
/// across an `.await`.
pub trait RepresentationCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Representation>;

    fn set(&self, key: CacheKey, value: Representation);

    /// Drop every tier cached for `uuid`, returning how many entries went away.
    fn purge(&self, uuid: Uuid) -> usize;
}

/// In-process LRU store shared by every request.
pub struct MemoryCache {
    entries: RwLock<LruCache<CacheKey, Representation>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RepresentationCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Representation> {
        rw_write(&self.entries, SOURCE, "get").get(key).cloned()
    }

    fn set(&self, key: CacheKey, value: Representation) {
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key, value);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!("elvis_cache_evict_total").increment(1);
        }
    }

    fn purge(&self, uuid: Uuid) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "purge");
        CacheKey::all_for(uuid)
            .filter(|key| entries.pop(key).is_some())
            .count()
    }
}

/// Store used when caching is disabled: every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl RepresentationCache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Option<Representation> {
        None
    }

    fn set(&self, _key: CacheKey, _value: Representation) {}

    fn purge(&self, _uuid: Uuid) -> usize {
        0
    }
}

/// Build the store selected by configuration.
pub fn build_cache(config: &CacheConfig) -> Arc<dyn RepresentationCache> {
    if config.enabled {
        Arc::new(MemoryCache::new(config))
    } else {
        Arc::new(NoopCache)
    }
}
