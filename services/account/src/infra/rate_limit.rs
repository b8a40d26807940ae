use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis;

use crate::domain::repository::RateLimiter;
use crate::error::AccountError;

/// Fixed-window counter per key.
///
/// One `MULTI { SET key 0 EX window NX; INCR key }` round trip: the first
/// request of a window creates the counter with its expiry, later ones only
/// increment it. Redis serializes the increments.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pub pool: Pool,
    pub max: u64,
    pub window: Duration,
}

impl RateLimiter for RedisRateLimiter {
    async fn take(&self, key: &str) -> Result<bool, AccountError> {
        let mut conn = self.pool.get().await.context("redis pool")?;
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(self.window.as_secs().max(1))
            .arg("NX")
            .ignore()
            .incr(key, 1)
            .query_async(&mut conn)
            .await
            .context("rate limit counter")?;
        Ok(is_exceeded(count, self.max))
    }
}

fn is_exceeded(count: u64, max: u64) -> bool {
    count > max
}
