//! Redis cache backend

use anyhow::Context;
use async_trait::async_trait;
use banner_core::ports::CacheBackend;
use banner_core::{CacheError, CacheResult};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, ConnectionInfo};
use std::time::Duration;
use tracing::info;

/// Redis-backed cache. The connection manager reconnects on its own, so one
/// instance is shared by every request.
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect and verify the server answers `PING`
    pub async fn connect(info: ConnectionInfo) -> anyhow::Result<Self> {
        let client = ::redis::Client::open(info).context("Invalid Redis connection settings")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        let cache = Self { manager };
        cache.ping().await.context("Redis did not answer PING")?;
        info!("Redis connection established");

        Ok(cache)
    }

    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        ::redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(e: ::redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(unavailable)?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        // PX keeps sub-second TTLs; Redis rejects a zero expiry
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        ::redis::cmd("SET")
            .arg(key)
            .arg(&value[..])
            .arg("PX")
            .arg(millis)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
