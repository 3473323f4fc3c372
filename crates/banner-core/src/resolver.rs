//! Banner read path
//!
//! Decides whether a lookup is answered from the cache or from storage,
//! applies the active-flag visibility rule, and refills the cache in the
//! background after every successful storage read.

use crate::cache::BannerCache;
use crate::ports::BannerStore;
use crate::{BannerError, Result};
use banner_types::{BannerContent, BannerSnapshot, FeatureId, TagId};
use std::sync::Arc;
use tracing::debug;

pub struct BannerResolver {
    store: Arc<dyn BannerStore>,
    cache: BannerCache,
}

impl BannerResolver {
    pub fn new(store: Arc<dyn BannerStore>, cache: BannerCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &BannerCache {
        &self.cache
    }

    /// Resolve the content of the banner for a feature and tag.
    ///
    /// `Ok(None)` means there is nothing the caller may see: either no banner
    /// matches, or the match is inactive and the caller is not privileged.
    ///
    /// With `force_refresh` the cache is not read, storage errors are returned
    /// as-is, and the fresh value is still written back to the cache.
    /// Otherwise any cache failure falls through to storage.
    pub async fn resolve(
        &self,
        feature_id: FeatureId,
        tag_id: TagId,
        force_refresh: bool,
        privileged: bool,
    ) -> Result<Option<BannerContent>> {
        let cached = if force_refresh {
            None
        } else {
            self.cached(feature_id, tag_id).await
        };

        let banner = match cached {
            Some(banner) => banner,
            None => match self.store.fetch_one(Some(feature_id), Some(tag_id)).await {
                Ok(banner) => {
                    // Not awaited: the request does not wait on the cache
                    self.cache.set_async(feature_id, tag_id, banner.clone());
                    banner
                }
                Err(BannerError::RecordAbsent) => {
                    debug!(feature_id, tag_id, "No banner found");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            },
        };

        if !banner.is_visible_to(privileged) {
            debug!(
                feature_id,
                tag_id,
                banner_id = banner.id,
                "Banner is inactive, hiding from unprivileged caller"
            );
            return Ok(None);
        }

        Ok(Some(banner.content))
    }

    async fn cached(&self, feature_id: FeatureId, tag_id: TagId) -> Option<BannerSnapshot> {
        match self.cache.get(feature_id, tag_id).await {
            Ok(banner) => banner,
            Err(e) => {
                self.cache
                    .events()
                    .read_failed(&BannerCache::key(feature_id, tag_id), &e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CacheBackend;
    use crate::testing::{
        banner, content, eventually, DownBackend, FakeStore, MapBackend, RecordingSink,
    };
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        store: Arc<FakeStore>,
        backend: Arc<MapBackend>,
        sink: Arc<RecordingSink>,
        resolver: BannerResolver,
    }

    fn fixture(banners: Vec<BannerSnapshot>) -> Fixture {
        fixture_with(FakeStore::with_banners(banners))
    }

    fn fixture_with(store: FakeStore) -> Fixture {
        let store = Arc::new(store);
        let backend = Arc::new(MapBackend::new());
        let sink = Arc::new(RecordingSink::default());
        let cache = BannerCache::new(backend.clone(), Duration::from_secs(300))
            .with_event_sink(sink.clone());
        let resolver = BannerResolver::new(store.clone(), cache);
        Fixture {
            store,
            backend,
            sink,
            resolver,
        }
    }

    fn success_banner() -> BannerSnapshot {
        banner(1, 0, &[0, 1], json!({"success": "true"}), true)
    }

    #[tokio::test]
    async fn test_scenario_from_storage() {
        let fx = fixture(vec![success_banner()]);

        let found = fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert_eq!(found, Some(content(json!({"success": "true"}))));

        let missing = fx.resolver.resolve(1, 2, false, false).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_absent_record_is_not_cached() {
        let fx = fixture(vec![success_banner()]);

        assert_eq!(fx.resolver.resolve(1, 2, false, false).await.unwrap(), None);
        assert_eq!(fx.resolver.resolve(1, 2, true, true).await.unwrap(), None);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fx.backend.is_empty());
        assert_eq!(fx.store.fetches(), 2);
    }

    #[tokio::test]
    async fn test_miss_populates_cache() {
        let fx = fixture(vec![success_banner()]);

        fx.resolver.resolve(0, 1, false, false).await.unwrap();

        assert!(eventually(|| fx.backend.raw("banner:0:1").is_some()).await);
        assert_eq!(fx.backend.snapshot("banner:0:1"), Some(success_banner()));
    }

    #[tokio::test]
    async fn test_warm_cache_skips_storage() {
        let fx = fixture(vec![success_banner()]);

        let first = fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert!(eventually(|| fx.backend.raw("banner:0:0").is_some()).await);

        for _ in 0..3 {
            let again = fx.resolver.resolve(0, 0, false, false).await.unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(fx.store.fetches(), 1);
    }

    #[tokio::test]
    async fn test_active_banner_visible_to_everyone() {
        let fx = fixture(vec![success_banner()]);

        for privileged in [false, true] {
            for force_refresh in [false, true] {
                let found = fx
                    .resolver
                    .resolve(0, 1, force_refresh, privileged)
                    .await
                    .unwrap();
                assert_eq!(found, Some(success_banner().content));
            }
        }
    }

    #[tokio::test]
    async fn test_inactive_banner_only_visible_to_privileged() {
        let hidden = banner(2, 5, &[7], json!({"draft": true}), false);
        let fx = fixture(vec![hidden.clone()]);

        assert_eq!(fx.resolver.resolve(5, 7, false, false).await.unwrap(), None);
        assert_eq!(fx.resolver.resolve(5, 7, true, false).await.unwrap(), None);
        assert_eq!(
            fx.resolver.resolve(5, 7, false, true).await.unwrap(),
            Some(hidden.content.clone())
        );
        assert_eq!(
            fx.resolver.resolve(5, 7, true, true).await.unwrap(),
            Some(hidden.content)
        );
    }

    #[tokio::test]
    async fn test_inactive_cached_banner_hidden() {
        let fx = fixture(vec![]);
        let hidden = banner(3, 1, &[1], json!({"x": 1}), false);
        fx.resolver.cache().set(1, 1, &hidden).await.unwrap();

        assert_eq!(fx.resolver.resolve(1, 1, false, false).await.unwrap(), None);
        assert_eq!(
            fx.resolver.resolve(1, 1, false, true).await.unwrap(),
            Some(hidden.content)
        );
        assert_eq!(fx.store.fetches(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_served_until_expiry() {
        let fx = fixture(vec![success_banner()]);
        fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert!(eventually(|| fx.backend.raw("banner:0:0").is_some()).await);

        // Deactivated in storage; the cached copy still says active
        let mut deactivated = success_banner();
        deactivated.is_active = false;
        fx.store.replace(deactivated);

        assert_eq!(
            fx.resolver.resolve(0, 0, false, false).await.unwrap(),
            Some(success_banner().content)
        );
        assert_eq!(fx.resolver.resolve(0, 0, true, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_and_refreshes_cache() {
        let fx = fixture(vec![success_banner()]);
        let outdated = banner(1, 0, &[0, 1], json!({"success": "false"}), true);
        fx.resolver.cache().set(0, 0, &outdated).await.unwrap();

        let found = fx.resolver.resolve(0, 0, true, false).await.unwrap();
        assert_eq!(found, Some(success_banner().content));
        assert_eq!(fx.store.fetches(), 1);

        assert!(
            eventually(|| fx.backend.snapshot("banner:0:0") == Some(success_banner())).await
        );
        // Subsequent plain reads are served the refreshed copy from cache
        let cached = fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert_eq!(cached, Some(success_banner().content));
        assert_eq!(fx.store.fetches(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_storage() {
        let fx = fixture(vec![success_banner()]);
        fx.backend.insert_raw("banner:0:0", b"\x00garbage");

        let found = fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert_eq!(found, Some(success_banner().content));
        assert_eq!(fx.store.fetches(), 1);
        assert_eq!(*fx.sink.reads.lock().unwrap(), vec!["banner:0:0"]);

        // The bad entry is overwritten by the background populate
        assert!(eventually(|| fx.backend.snapshot("banner:0:0").is_some()).await);
    }

    #[tokio::test]
    async fn test_unavailable_cache_falls_back_to_storage() {
        let store = Arc::new(FakeStore::with_banners(vec![success_banner()]));
        let sink = Arc::new(RecordingSink::default());
        let cache = BannerCache::new(Arc::new(DownBackend), Duration::from_secs(60))
            .with_event_sink(sink.clone());
        let resolver = BannerResolver::new(store.clone(), cache);

        let found = resolver.resolve(0, 0, false, false).await.unwrap();
        assert_eq!(found, Some(success_banner().content));

        assert_eq!(sink.reads.lock().unwrap().len(), 1);
        assert!(eventually(|| sink.populates.lock().unwrap().len() == 1).await);
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let fx = fixture_with(FakeStore::broken());

        let result = fx.resolver.resolve(0, 0, false, false).await;
        assert!(matches!(result, Err(BannerError::Storage(_))));
    }

    #[tokio::test]
    async fn test_forced_storage_error_not_masked_by_cache() {
        let fx = fixture_with(FakeStore::broken());
        fx.resolver
            .cache()
            .set(0, 0, &success_banner())
            .await
            .unwrap();

        let forced = fx.resolver.resolve(0, 0, true, false).await;
        assert!(matches!(forced, Err(BannerError::Storage(_))));

        // Without forcing, the cached copy answers
        let plain = fx.resolver.resolve(0, 0, false, false).await.unwrap();
        assert_eq!(plain, Some(success_banner().content));
    }

    #[tokio::test]
    async fn test_concurrent_resolves_leave_a_valid_entry() {
        let fx = Arc::new(fixture(vec![success_banner()]));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let fx = fx.clone();
            handles.push(tokio::spawn(async move {
                fx.resolver.resolve(0, 0, false, false).await
            }));
        }
        for handle in handles {
            let found = handle.await.unwrap().unwrap();
            assert_eq!(found, Some(success_banner().content));
        }

        assert!(eventually(|| fx.backend.snapshot("banner:0:0").is_some()).await);
        let data = fx.backend.get("banner:0:0").await.unwrap().unwrap();
        let cached: BannerSnapshot = serde_json::from_slice(&data).unwrap();
        assert_eq!(cached, success_banner());
    }
}
