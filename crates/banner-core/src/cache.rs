//! Banner cache layer
//!
//! Stores serialized banner snapshots keyed by `(feature_id, tag_id)` with a
//! fixed TTL. The cache is an optimization only: callers treat every error
//! from here as a miss.

use crate::ports::{CacheBackend, CacheEventSink, TracingEventSink};
use crate::{CacheError, CacheResult};
use banner_types::{BannerSnapshot, FeatureId, TagId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Clone)]
pub struct BannerCache {
    backend: Arc<dyn CacheBackend>,
    events: Arc<dyn CacheEventSink>,
    ttl: Duration,
}

impl BannerCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            events: Arc::new(TracingEventSink),
            ttl,
        }
    }

    /// Replace the sink that receives swallowed cache failures
    pub fn with_event_sink(mut self, events: Arc<dyn CacheEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &dyn CacheEventSink {
        self.events.as_ref()
    }

    pub fn key(feature_id: FeatureId, tag_id: TagId) -> String {
        format!("banner:{}:{}", feature_id, tag_id)
    }

    /// Load a banner snapshot.
    ///
    /// Returns `Ok(None)` when nothing is cached under the key and
    /// `CacheError::Corrupt` when the stored bytes are not a snapshot.
    pub async fn get(
        &self,
        feature_id: FeatureId,
        tag_id: TagId,
    ) -> CacheResult<Option<BannerSnapshot>> {
        let key = Self::key(feature_id, tag_id);
        let Some(data) = self.backend.get(&key).await? else {
            debug!(key = %key, "Banner cache miss");
            return Ok(None);
        };

        let banner = serde_json::from_slice::<BannerSnapshot>(&data)
            .map_err(|e| CacheError::Corrupt(e.to_string()))?;
        debug!(key = %key, "Loaded banner from cache");
        Ok(Some(banner))
    }

    /// Store a snapshot, overwriting whatever is cached under the key
    pub async fn set(
        &self,
        feature_id: FeatureId,
        tag_id: TagId,
        banner: &BannerSnapshot,
    ) -> CacheResult<()> {
        let key = Self::key(feature_id, tag_id);
        let data =
            serde_json::to_vec(banner).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.backend.set_with_ttl(&key, data, self.ttl).await?;
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        debug!(key = %key, ttl_ms, "Saved banner to cache");
        Ok(())
    }

    /// Store a snapshot on a detached task.
    ///
    /// The task owns its copy of the snapshot. Failures go to the event sink
    /// and are not retried. Dropping the returned handle does not cancel it.
    pub fn set_async(
        &self,
        feature_id: FeatureId,
        tag_id: TagId,
        banner: BannerSnapshot,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.set(feature_id, tag_id, &banner).await {
                cache
                    .events
                    .populate_failed(&Self::key(feature_id, tag_id), &e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{banner, DownBackend, MapBackend, RecordingSink};
    use serde_json::json;

    #[test]
    fn test_key_format() {
        assert_eq!(BannerCache::key(3, 14), "banner:3:14");
        assert_eq!(BannerCache::key(-1, 0), "banner:-1:0");
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let backend = Arc::new(MapBackend::new());
        let cache = BannerCache::new(backend.clone(), Duration::from_secs(300));
        let stored = banner(1, 2, &[3, 4], json!({"title": "sale"}), true);

        cache.set(2, 3, &stored).await.unwrap();

        assert_eq!(cache.get(2, 3).await.unwrap(), Some(stored));
        assert_eq!(backend.ttl("banner:2:3"), Some(Duration::from_secs(300)));
        // Keyed by the lookup, not by every tag on the banner
        assert_eq!(cache.get(2, 4).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let backend = Arc::new(MapBackend::new());
        let cache = BannerCache::new(backend, Duration::from_secs(60));

        cache
            .set(1, 1, &banner(1, 1, &[1], json!({"v": 1}), true))
            .await
            .unwrap();
        cache
            .set(1, 1, &banner(1, 1, &[1], json!({"v": 2}), false))
            .await
            .unwrap();

        let cached = cache.get(1, 1).await.unwrap().unwrap();
        assert_eq!(cached.content["v"], 2);
        assert!(!cached.is_active);
    }

    #[tokio::test]
    async fn test_set_with_oversized_ttl() {
        let backend = Arc::new(MapBackend::new());
        let cache = BannerCache::new(backend.clone(), Duration::MAX);
        let stored = banner(1, 1, &[1], json!({}), true);

        cache.set(1, 1, &stored).await.unwrap();

        assert_eq!(backend.ttl("banner:1:1"), Some(Duration::MAX));
        assert_eq!(backend.snapshot("banner:1:1"), Some(stored));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let backend = Arc::new(MapBackend::new());
        backend.insert_raw("banner:5:6", b"{not json");
        let cache = BannerCache::new(backend, Duration::from_secs(60));

        let result = cache.get(5, 6).await;
        assert!(matches!(result, Err(CacheError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_unavailable_backend() {
        let cache = BannerCache::new(Arc::new(DownBackend), Duration::from_secs(60));

        assert!(matches!(
            cache.get(1, 1).await,
            Err(CacheError::Unavailable(_))
        ));
        let stored = banner(1, 1, &[1], json!({}), true);
        assert!(cache.set(1, 1, &stored).await.is_err());
    }

    #[tokio::test]
    async fn test_set_async_writes_in_background() {
        let backend = Arc::new(MapBackend::new());
        let cache = BannerCache::new(backend.clone(), Duration::from_secs(60));
        let stored = banner(9, 1, &[2], json!({"a": "b"}), true);

        cache.set_async(1, 2, stored.clone()).await.unwrap();

        assert_eq!(backend.snapshot("banner:1:2"), Some(stored));
    }

    #[tokio::test]
    async fn test_set_async_reports_failure_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let cache = BannerCache::new(Arc::new(DownBackend), Duration::from_secs(60))
            .with_event_sink(sink.clone());

        cache
            .set_async(4, 2, banner(1, 4, &[2], json!({}), true))
            .await
            .unwrap();

        assert_eq!(*sink.populates.lock().unwrap(), vec!["banner:4:2"]);
    }
}
