//! Observability sink for cache failures the read path swallows

use crate::CacheError;
use tracing::warn;

pub trait CacheEventSink: Send + Sync {
    /// A cache read failed and the lookup fell back to storage
    fn read_failed(&self, key: &str, error: &CacheError);

    /// A background cache populate failed. It will not be retried.
    fn populate_failed(&self, key: &str, error: &CacheError);
}

/// Reports cache failures as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl CacheEventSink for TracingEventSink {
    fn read_failed(&self, key: &str, error: &CacheError) {
        warn!(key = key, "Failed to load banner from cache: {}", error);
    }

    fn populate_failed(&self, key: &str, error: &CacheError) {
        warn!(key = key, "Failed to save banner to cache: {}", error);
    }
}
