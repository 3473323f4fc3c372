//! Storage trait for the source of record

use crate::Result;
use async_trait::async_trait;
use banner_types::{BannerDraft, BannerFilter, BannerId, BannerSnapshot, FeatureId, TagId};

/// Banner store
#[async_trait]
pub trait BannerStore: Send + Sync {
    /// Point lookup. Set filters are ANDed and at most one row is returned;
    /// no match yields `BannerError::RecordAbsent`.
    async fn fetch_one(
        &self,
        feature_id: Option<FeatureId>,
        tag_id: Option<TagId>,
    ) -> Result<BannerSnapshot>;

    async fn list(&self, filter: &BannerFilter) -> Result<Vec<BannerSnapshot>>;
    async fn create(&self, draft: &BannerDraft) -> Result<BannerId>;
    async fn update(&self, id: BannerId, draft: &BannerDraft) -> Result<()>;
    async fn delete(&self, id: BannerId) -> Result<()>;
    async fn exists(&self, id: BannerId) -> Result<bool>;
}
