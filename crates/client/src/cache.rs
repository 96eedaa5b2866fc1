//! Short-lived memoization of read results.
//!
//! Keys are deterministic signatures derived from the resource kind plus a
//! canonical (sorted) serialization of the filter parameters, so equivalent
//! queries hit the same entry regardless of parameter order. Entries are
//! evicted lazily on read; with TTLs around two minutes and a handful of
//! live queries there is nothing for a background sweep to win.
//!
//! Concurrent misses for the same signature are allowed to race: both fetch,
//! both write, last write wins. Reads are idempotent, so the worst case is
//! one redundant network call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use campusmarket_core::{Resource, ResourceKind};

/// What a cache entry holds: a list snapshot or a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    List(Vec<Resource>),
    One(Resource),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedPayload,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// An entry is readable only while `now < stored_at + ttl`.
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Compute the cache signature for a query.
///
/// Filters are sorted before serialization so `[a=1, b=2]` and `[b=2, a=1]`
/// produce the same key. The kind prefix is always followed by `|`, which
/// is what kind-wide invalidation matches on.
pub fn signature(kind: ResourceKind, filters: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = filters.iter().collect();
    pairs.sort();

    let mut sig = String::from(kind.as_str());
    sig.push('|');
    for (key, value) in pairs {
        sig.push_str(key);
        sig.push('=');
        sig.push_str(value);
        sig.push('|');
    }
    sig
}

/// Process-wide, in-memory, TTL-based response cache.
///
/// Owned by the [`crate::client::ResourceClient`] that writes it; the
/// client is also the sole invalidator (kind-wide eviction after every
/// successful mutation). Interior locking keeps it shareable across tasks;
/// the lock is never held across a suspension point.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a signature. An expired entry is removed and reported as a
    /// miss.
    pub fn get(&self, signature: &str) -> Option<CachedPayload> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(signature) {
            Some(entry) if !entry.is_expired(Instant::now()) => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(signature);
                tracing::debug!(signature, "Evicted expired cache entry");
                None
            }
            None => None,
        }
    }

    /// Store a payload under a signature for `ttl`.
    pub fn insert(&self, signature: impl Into<String>, payload: CachedPayload, ttl: Duration) {
        let signature = signature.into();
        let entry = CacheEntry {
            payload,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(signature, entry);
    }

    /// Drop every entry for one resource kind. Returns the eviction count.
    pub fn invalidate_kind(&self, kind: ResourceKind) -> usize {
        let prefix = format!("{}|", kind.as_str());
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|sig, _| !sig.starts_with(&prefix));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(kind = %kind, evicted, "Invalidated cache entries after mutation");
        }
        evicted
    }

    /// Drop everything. Used on logout and test teardown.
    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
