//! In-process result caching with TTL expiry
//!
//! [`Cache`] is a generic key → value store whose entries expire a fixed
//! duration after they were last set. Expiry is evaluated lazily: an expired
//! entry reads as absent and is pruned on that read, and [`Cache::sync`]
//! sweeps every expired entry at once. There is no background eviction.
//!
//! [`ManifestCache`] specialises the cache for object collections. It copies
//! on both `set` and `get`, so neither the caller that stored a collection
//! nor any caller that reads it back can corrupt the cached copy by mutating
//! their own.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use log::trace;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::object::{Object, Values};

/// TTL used when the configured TTL is zero
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached value and the instant it stops being valid
#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe TTL cache keyed by caller-computed strings
#[derive(Debug)]
pub struct Cache<T> {
    entries: Arc<RwLock<HashMap<String, Entry<T>>>>,
    ttl: Duration,
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

fn poisoned(context: &str) -> Error {
    Error::LockPoisoned {
        context: context.to_string(),
    }
}

impl<T: Clone> Cache<T> {
    /// Create an empty cache; a zero `ttl` selects [`DEFAULT_TTL`]
    pub fn new(ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// The effective TTL applied by `set`
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a copy of the value for `key`, if present and not expired
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| poisoned("cache read"))?;
            match entries.get(key) {
                None => {
                    trace!("cache miss: {}", key);
                    return Ok(None);
                }
                Some(entry) if !entry.is_expired(now) => {
                    trace!("cache hit: {}", key);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: prune it, unless another writer refreshed it meanwhile.
        let mut entries = self.entries.write().map_err(|_| poisoned("cache prune"))?;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        trace!("cache expired: {}", key);
        Ok(None)
    }

    /// Store `value` under `key`, expiring one TTL from now
    pub fn set(&self, key: impl Into<String>, value: T) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.write().map_err(|_| poisoned("cache write"))?;
        entries.insert(key.into(), entry);
        Ok(())
    }

    /// Get the value for `key`, or compute, store and return it
    pub fn get_or_insert_with<F>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(cached) = self.get(key)? {
            return Ok(cached);
        }

        let value = compute()?;
        self.set(key, value.clone())?;
        Ok(value)
    }

    /// Remove every expired entry, returning how many were removed
    pub fn sync(&self) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned("cache sync"))?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    /// Number of stored entries, expired ones included until pruned
    pub fn len(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(|_| poisoned("cache len"))?;
        Ok(entries.len())
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Clear all cached entries
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned("cache clear"))?;
        entries.clear();
        Ok(())
    }
}

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Cache of rendered object collections that never hands out shared data
#[derive(Debug, Clone, Default)]
pub struct ManifestCache {
    inner: Cache<Vec<Object>>,
}

impl ManifestCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::new(ttl),
        }
    }

    /// Get a private copy of the collection stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<Vec<Object>>> {
        self.inner.get(key)
    }

    /// Store a copy of `objects` under `key`
    pub fn set(&self, key: impl Into<String>, objects: &[Object]) -> Result<()> {
        self.inner.set(key, objects.to_vec())
    }

    /// Remove every expired entry
    pub fn sync(&self) -> Result<usize> {
        self.inner.sync()
    }

    pub fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.inner.is_empty()
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.clear()
    }
}

/// Derive a stable cache key from a Source identity and its effective values.
///
/// Map keys serialise in sorted order, so equal trees always hash equally.
pub fn cache_key(identity: &str, values: &Values) -> Result<String> {
    let encoded = serde_json::to_vec(values)?;
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update([0u8]);
    hasher.update(&encoded);
    Ok(hex::encode(hasher.finalize()))
}
