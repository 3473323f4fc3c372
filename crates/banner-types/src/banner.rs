//! Banner types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type BannerId = i32;
pub type FeatureId = i32;
pub type TagId = i32;

/// Banner payload. Passed through untouched; no schema is imposed on it.
pub type BannerContent = Map<String, Value>;

/// A banner as stored, including storage-maintained fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerSnapshot {
    #[serde(rename = "banner_id")]
    pub id: BannerId,
    pub tag_ids: Vec<TagId>,
    pub feature_id: FeatureId,
    pub content: BannerContent,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BannerSnapshot {
    /// Inactive banners are only visible to privileged callers
    pub fn is_visible_to(&self, privileged: bool) -> bool {
        self.is_active || privileged
    }
}

/// Banner fields supplied by administrators on create and update.
///
/// Missing fields fall back to their zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerDraft {
    pub tag_ids: Vec<TagId>,
    pub feature_id: FeatureId,
    pub content: BannerContent,
    pub is_active: bool,
}

/// Criteria for listing banners. All set criteria are ANDed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BannerFilter {
    pub feature_id: Option<FeatureId>,
    pub tag_id: Option<TagId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BannerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(mut self, feature_id: FeatureId) -> Self {
        self.feature_id = Some(feature_id);
        self
    }

    pub fn tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    /// Whether a banner satisfies the feature and tag criteria
    pub fn accepts(&self, banner: &BannerSnapshot) -> bool {
        self.feature_id.map_or(true, |f| banner.feature_id == f)
            && self.tag_id.map_or(true, |t| banner.tag_ids.contains(&t))
    }
}
