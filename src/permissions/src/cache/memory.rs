//! In-process TTL cache

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{CacheStats, PermissionCache};

/// Upper bound for expiry instants, keeps `Instant` arithmetic in range
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

#[derive(Clone)]
struct CachedEntry {
    value: Value,
    expires_at: Instant,
}

impl CachedEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory permission cache
///
/// Provides:
/// - Thread-safe storage with DashMap
/// - Lazy expiry: an expired entry is removed when read
/// - Explicit sweep with [`MemoryCache::cleanup_expired`] or a background
///   sweeper task
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedEntry>>,

    stats: Arc<DashMap<&'static str, u64>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        sweep(&self.entries, &self.stats)
    }

    /// Start a task sweeping expired entries every `interval`
    ///
    /// The task holds only weak references to the storage and exits once
    /// every handle to this cache has been dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let entries = Arc::downgrade(&self.entries);
        let stats = Arc::downgrade(&self.stats);

        info!("Starting permission cache sweeper every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let (Some(entries), Some(stats)) = (entries.upgrade(), stats.upgrade()) else {
                    debug!("Permission cache dropped, stopping sweeper");
                    break;
                };
                let removed = sweep(&entries, &stats);
                if removed > 0 {
                    debug!("Swept {} expired permission cache entries", removed);
                }
            }
        })
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: get_stat(&self.stats, "hits"),
            misses: get_stat(&self.stats, "misses"),
            expirations: get_stat(&self.stats, "expirations"),
            entries: self.entries.len(),
        }
    }
}

#[async_trait]
impl PermissionCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(now) {
                // Release the shard lock before removing
                drop(entry);
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                increment_stat(&self.stats, "expirations");
                increment_stat(&self.stats, "misses");
                return None;
            }

            increment_stat(&self.stats, "hits");
            return Some(entry.value.clone());
        }

        increment_stat(&self.stats, "misses");
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CachedEntry::new(value, ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes every entry; hit, miss and expiration counters are kept
    async fn clear(&self) {
        self.entries.clear();
    }

    async fn delete_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}

fn sweep(entries: &DashMap<String, CachedEntry>, stats: &DashMap<&'static str, u64>) -> usize {
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    let removed = before.saturating_sub(entries.len());

    if removed > 0 {
        stats
            .entry("expirations")
            .and_modify(|count| *count += removed as u64)
            .or_insert(removed as u64);
    }
    removed
}

fn increment_stat(stats: &DashMap<&'static str, u64>, key: &'static str) {
    stats.entry(key).and_modify(|count| *count += 1).or_insert(1);
}

fn get_stat(stats: &DashMap<&'static str, u64>, key: &str) -> u64 {
    stats.get(key).map(|v| *v).unwrap_or(0)
}
