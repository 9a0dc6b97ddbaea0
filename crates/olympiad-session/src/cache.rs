//! Session cache with fixed-TTL entries and sweep-based reclamation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::Result;

/// Entry stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,

    /// When the value was resolved.
    pub created_at: DateTime<Utc>,

    /// Absolute expiry. Always `created_at + ttl`.
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Create an entry resolved at `now` that lives for `ttl`.
    pub fn new(value: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Whether the entry may still be served at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Keyed store of expiring entries.
///
/// Implementations only store and return entries; callers must check
/// [`CacheEntry::is_live_at`] on every read. [`SessionCache::sweep`] reclaims
/// memory and is never relied on for correctness.
#[async_trait]
pub trait SessionCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Fetch the entry stored under `key`, expired or not.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<V>>>;

    /// Insert or replace the entry under `key`.
    async fn put(&self, key: &str, entry: CacheEntry<V>) -> Result<()>;

    /// Remove every entry with `expires_at <= now`. Returns how many were removed.
    async fn sweep(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Number of stored entries, including expired ones not yet swept.
    async fn len(&self) -> Result<usize>;
}

/// Thread-safe shared cache handle.
pub type SharedSessionCache<V> = Arc<dyn SessionCache<V>>;

/// Process-local [`SessionCache`] backed by a `HashMap`.
///
/// Concurrent writers to the same key are not coordinated; the last
/// write wins.
pub struct MemorySessionCache<V> {
    inner: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
}

impl<V> MemorySessionCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Snapshot of the cache size and how many entries are live at `now`.
    pub async fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            size: inner.len(),
            live: inner.values().filter(|e| e.is_live_at(now)).count(),
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl<V> Default for MemorySessionCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for MemorySessionCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<V> SessionCache<V> for MemorySessionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        let entry = self.inner.read().await.get(key).cloned();
        trace!(found = entry.is_some(), "Session cache lookup");
        Ok(entry)
    }

    async fn put(&self, key: &str, entry: CacheEntry<V>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.insert(key.to_string(), entry);
        trace!(cache_size = inner.len(), "Session cache entry stored");
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, entry| entry.is_live_at(now));
        let removed = before - inner.len();

        if removed > 0 {
            debug!(removed, remaining = inner.len(), "Swept expired sessions");
        }

        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.len())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored entries, expired or not.
    pub size: usize,

    /// Entries still valid at the time of the snapshot.
    pub live: usize,
}
