//! In-memory doubles for the port traits, shared by the unit tests

use crate::ports::{BannerStore, CacheBackend, CacheEventSink};
use crate::{BannerError, CacheError, CacheResult, Result};
use async_trait::async_trait;
use banner_types::{
    BannerContent, BannerDraft, BannerFilter, BannerId, BannerSnapshot, FeatureId, TagId,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn content(value: Value) -> BannerContent {
    match value {
        Value::Object(map) => map,
        other => panic!("banner content must be an object, got {}", other),
    }
}

/// Fixed timestamp so snapshots built twice compare equal
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
}

pub fn banner(
    id: BannerId,
    feature_id: FeatureId,
    tag_ids: &[TagId],
    body: Value,
    is_active: bool,
) -> BannerSnapshot {
    let now = fixed_time();
    BannerSnapshot {
        id,
        tag_ids: tag_ids.to_vec(),
        feature_id,
        content: content(body),
        is_active,
        created_at: now,
        updated_at: now,
    }
}

/// Polls `cond` until it holds, giving spawned tasks a chance to run
pub async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Cache backend over a plain map; TTLs are recorded but not enforced
#[derive(Default)]
pub struct MapBackend {
    entries: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
}

impl MapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), Duration::from_secs(60)));
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn snapshot(&self, key: &str) -> Option<BannerSnapshot> {
        self.raw(key)
            .and_then(|data| serde_json::from_slice(&data).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl CacheBackend for MapBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }
}

/// Cache backend whose every call fails as if the server were down
pub struct DownBackend;

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// Records every failure it is told about
#[derive(Default)]
pub struct RecordingSink {
    pub reads: Mutex<Vec<String>>,
    pub populates: Mutex<Vec<String>>,
}

impl CacheEventSink for RecordingSink {
    fn read_failed(&self, key: &str, _error: &CacheError) {
        self.reads.lock().unwrap().push(key.to_string());
    }

    fn populate_failed(&self, key: &str, _error: &CacheError) {
        self.populates.lock().unwrap().push(key.to_string());
    }
}

/// Store over a vector of banners that counts point lookups
#[derive(Default)]
pub struct FakeStore {
    banners: Mutex<Vec<BannerSnapshot>>,
    fetches: AtomicUsize,
    broken: bool,
}

impl FakeStore {
    pub fn with_banners(banners: Vec<BannerSnapshot>) -> Self {
        Self {
            banners: Mutex::new(banners),
            ..Self::default()
        }
    }

    /// A store whose every call fails with a storage error
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn replace(&self, banner: BannerSnapshot) {
        let mut banners = self.banners.lock().unwrap();
        banners.retain(|b| b.id != banner.id);
        banners.push(banner);
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            return Err(BannerError::Storage("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BannerStore for FakeStore {
    async fn fetch_one(
        &self,
        feature_id: Option<FeatureId>,
        tag_id: Option<TagId>,
    ) -> Result<BannerSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let filter = BannerFilter {
            feature_id,
            tag_id,
            ..BannerFilter::default()
        };
        self.banners
            .lock()
            .unwrap()
            .iter()
            .find(|b| filter.accepts(b))
            .cloned()
            .ok_or(BannerError::RecordAbsent)
    }

    async fn list(&self, filter: &BannerFilter) -> Result<Vec<BannerSnapshot>> {
        self.check()?;
        let banners = self.banners.lock().unwrap();
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(banners
            .iter()
            .filter(|b| filter.accepts(b))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create(&self, draft: &BannerDraft) -> Result<BannerId> {
        self.check()?;
        let mut banners = self.banners.lock().unwrap();
        let id = banners.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        banners.push(BannerSnapshot {
            id,
            tag_ids: draft.tag_ids.clone(),
            feature_id: draft.feature_id,
            content: draft.content.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update(&self, id: BannerId, draft: &BannerDraft) -> Result<()> {
        self.check()?;
        let mut banners = self.banners.lock().unwrap();
        if let Some(banner) = banners.iter_mut().find(|b| b.id == id) {
            banner.tag_ids = draft.tag_ids.clone();
            banner.feature_id = draft.feature_id;
            banner.content = draft.content.clone();
            banner.is_active = draft.is_active;
            banner.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: BannerId) -> Result<()> {
        self.check()?;
        self.banners.lock().unwrap().retain(|b| b.id != id);
        Ok(())
    }

    async fn exists(&self, id: BannerId) -> Result<bool> {
        self.check()?;
        Ok(self.banners.lock().unwrap().iter().any(|b| b.id == id))
    }
}
