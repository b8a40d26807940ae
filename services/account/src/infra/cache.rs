use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::CodeStore;
use crate::error::AccountError;

/// One-time codes in Redis: `SET key code EX ttl`, `GET`, `DEL`.
#[derive(Clone)]
pub struct RedisCodeStore {
    pub pool: Pool,
}

impl RedisCodeStore {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AccountError> {
        Ok(self.pool.get().await.context("redis pool")?)
    }
}

impl CodeStore for RedisCodeStore {
    async fn set(&self, key: &str, code: &str, ttl: Duration) -> Result<(), AccountError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(key, code, ttl.as_secs().max(1))
            .await
            .context("store one-time code")?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AccountError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await.context("read one-time code")?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), AccountError> {
        let mut conn = self.conn().await?;
        let (): () = conn.del(key).await.context("delete one-time code")?;
        Ok(())
    }

    async fn ping(&self) -> bool {
        let Ok(mut conn) = self.pool.get().await else {
            return false;
        };
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
