//! In-memory cache using DashMap (used when no Redis host is configured)

use async_trait::async_trait;
use banner_core::ports::CacheBackend;
use banner_core::CacheResult;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process cache with per-entry TTL
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: Vec<u8>,
    /// `None` when the TTL is too large to represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl MemoryCache {
    /// Must be called inside a Tokio runtime; spawns the expiry sweeper.
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        cache.start_cleanup_task();

        cache
    }

    fn start_cleanup_task(&self) {
        // Weak so the sweeper stops once the cache is dropped
        let data = Arc::downgrade(&self.data);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let Some(data) = data.upgrade() else {
                    break;
                };
                let now = Instant::now();
                data.retain(|_, entry| !entry.is_expired(now));
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value = self.data.get(key).and_then(|entry| {
            if entry.is_expired(Instant::now()) {
                None
            } else {
                Some(entry.value.clone())
            }
        });
        if value.is_none() {
            self.data
                .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.data.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }
}
