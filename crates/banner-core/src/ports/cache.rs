//! Key/value cache backend trait

use crate::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Byte-level cache backend.
///
/// Implementations must make `set_with_ttl` atomic per key: a reader sees
/// either the previous value or the new one, never a partial write.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value, `None` when absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value with TTL, overwriting any existing entry
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;
}
