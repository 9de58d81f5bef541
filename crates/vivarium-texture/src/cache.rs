//! Rendered-surface cache.
//!
//! Entries are keyed by a caller-chosen string. An entry is reused while the
//! request's growth level stays within the tolerance of the one it was
//! rendered at and the structural fingerprint matches; otherwise it is
//! rendered again in place. Capacity overflow evicts from the front of the
//! order queue, which is insertion order under [`EvictionPolicy::Fifo`] and
//! recency under [`EvictionPolicy::Lru`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use vivarium_spec::{EngineConfig, EvictionPolicy};

use crate::buffer::PixelBuffer;

/// A cached render.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub buffer: Arc<PixelBuffer>,
    /// Growth level the buffer was rendered at.
    pub growth_level: f64,
    /// Structural request fingerprint the buffer was rendered from.
    pub fingerprint: String,
    pub created_at: Instant,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups for keys with no entry.
    pub misses: u64,
    /// Lookups that found a stale entry and rendered it again.
    pub regenerations: u64,
    pub evictions: u64,
}

/// Bounded key-to-render cache.
#[derive(Debug)]
pub struct TextureCache {
    capacity: usize,
    tolerance: f64,
    policy: EvictionPolicy,
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    stats: CacheStats,
}

impl TextureCache {
    pub fn new(capacity: usize, tolerance: f64, policy: EvictionPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            tolerance,
            policy,
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity, config.growth_tolerance, config.eviction)
    }

    /// Whether `entry` can serve a request at `growth_level` with `fingerprint`.
    fn is_fresh(&self, entry: &CacheEntry, growth_level: f64, fingerprint: &str) -> bool {
        (entry.growth_level - growth_level).abs() < self.tolerance && entry.fingerprint == fingerprint
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    /// Return the cached buffer for `key`, or run `render` and store its result.
    ///
    /// The flag is `true` for a cache hit.
    pub fn get_or_render<F>(
        &mut self,
        key: &str,
        growth_level: f64,
        fingerprint: &str,
        render: F,
    ) -> (Arc<PixelBuffer>, bool)
    where
        F: FnOnce() -> PixelBuffer,
    {
        let cached = self.entries.get(key).map(|entry| {
            (
                self.is_fresh(entry, growth_level, fingerprint),
                Arc::clone(&entry.buffer),
                entry.growth_level,
            )
        });

        match cached {
            Some((true, buffer, _)) => {
                self.stats.hits += 1;
                if self.policy == EvictionPolicy::Lru {
                    self.touch(key);
                }
                debug!("texture cache hit for {:?}", key);
                return (buffer, true);
            }
            Some((false, _, cached_growth)) => {
                self.stats.regenerations += 1;
                debug!(
                    "texture cache entry {:?} is stale (growth {} -> {}), re-rendering",
                    key, cached_growth, growth_level
                );
            }
            None => {
                self.stats.misses += 1;
                debug!("texture cache miss for {:?}", key);
            }
        }

        let buffer = Arc::new(render());
        self.insert(key, growth_level, fingerprint, Arc::clone(&buffer));
        (buffer, false)
    }

    /// Store `buffer` under `key`.
    ///
    /// Replacing an existing key keeps its queue position under FIFO and
    /// moves it to the back under LRU.
    pub fn insert(
        &mut self,
        key: &str,
        growth_level: f64,
        fingerprint: &str,
        buffer: Arc<PixelBuffer>,
    ) {
        let entry = CacheEntry {
            buffer,
            growth_level,
            fingerprint: fingerprint.to_string(),
            created_at: Instant::now(),
        };
        if self.entries.insert(key.to_string(), entry).is_some() {
            if self.policy == EvictionPolicy::Lru {
                self.touch(key);
            }
            return;
        }

        self.order.push_back(key.to_string());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
                debug!("texture cache evicted {:?}", oldest);
            }
        }
    }

    /// Look at an entry without counting or reordering.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys from next-to-evict to most recent.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
