//! # Cache Invalidation
//!
//! Dashboard figures are cached in Redis by the reporting side. Creating a
//! document makes them stale, so services drop the key after a successful
//! insert. Deployments without Redis use [`NoopCache`].
//!
//! Invalidation is best effort: a cache failure is logged by the caller and
//! never fails the create that triggered it.

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

/// Key holding the cached dashboard summary.
pub const DASHBOARD_CACHE_KEY: &str = "cache:dashboard";

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Drops cached entries that a write made stale.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Removes `key`. Missing keys are not an error.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Checks the cache backend is reachable.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Cache that does nothing (no Redis configured, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl CacheInvalidator for NoopCache {
    async fn invalidate(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Redis-backed invalidator.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Creates the client. Does not connect until first use.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(RedisCache { client })
    }
}

#[async_trait]
impl CacheInvalidator for RedisCache {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = conn.del(key).await?;
        debug!(key = %key, removed, "Cache key invalidated");
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
