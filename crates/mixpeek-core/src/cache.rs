//! Bounded TTL cache.
//!
//! Entries expire `ttl` after insertion and are removed lazily on the next
//! read. When the cache is full, `set` evicts the oldest-inserted entry,
//! regardless of how often it was read.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum characters of each key part that feed the fingerprint.
const KEY_PART_MAX_LEN: usize = 500;

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub capacity: usize,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_secs: 300,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// A disabled cache.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the TTL in seconds.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    /// `hits / (hits + misses)`, 0 when there were no reads.
    pub hit_rate: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A bounded map with per-entry expiry and insertion-order eviction.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    order: VecDeque<String>,
    capacity: usize,
    ttl: Duration,
    enabled: bool,
    hits: u64,
    misses: u64,
    sets: u64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            ttl,
            enabled: true,
            hits: 0,
            misses: 0,
            sets: 0,
        }
    }

    /// Creates a cache from config.
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(config.capacity, config.ttl());
        cache.enabled = config.enabled;
        cache
    }

    /// Returns the value for `key` if present and not expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };

        if expired {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Inserts or replaces a value. Replacing counts as a fresh insertion.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if !self.enabled || self.capacity == 0 {
            return;
        }

        let key = key.into();
        if self.entries.contains_key(&key) {
            self.remove(&key);
        }

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        self.sets += 1;
    }

    /// Returns true if `key` is present and not expired. Does not touch counters.
    pub fn has(&self, key: &str) -> bool {
        self.enabled
            && self
                .entries
                .get(key)
                .map(|e| e.inserted_at.elapsed() < self.ttl)
                .unwrap_or(false)
    }

    /// Removes `key`. Returns true if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Zeroes the counters.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.sets = 0;
    }

    /// Enables or disables the cache. Disabling clears it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Returns true if the cache is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the counters.
    pub fn stats(&self) -> CacheStats {
        let reads = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            hit_rate: if reads == 0 {
                0.0
            } else {
                self.hits as f64 / reads as f64
            },
            enabled: self.enabled,
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
    }
}

/// A [`TtlCache`] behind a mutex, for sharing across tasks.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Mutex<TtlCache<V>>,
}

impl<V: Clone> SharedCache<V> {
    /// Creates a shared cache from config.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(TtlCache::from_config(config)),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.lock().set(key, value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn reset_stats(&self) {
        self.inner.lock().reset_stats();
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().set_enabled(enabled);
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }
}

/// Builds a stable cache key from input parts.
///
/// Each part is trimmed, lowercased, and truncated before hashing, so inputs
/// that differ only in case or surrounding whitespace share a key.
pub fn cache_key(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        let normalized: String = part
            .trim()
            .to_lowercase()
            .chars()
            .take(KEY_PART_MAX_LEN)
            .collect();
        hasher.update(normalized.as_bytes());
        // unit separator keeps ("ab", "c") distinct from ("a", "bc")
        hasher.update([0x1f]);
    }
    format!("{}:{:x}", prefix, hasher.finalize())
}
