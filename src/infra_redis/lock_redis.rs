use crate::application_port::*;
use crate::domain_port::*;
use chrono::Utc;
use nanoid::nanoid;
use redis::Script;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::time::Instant;
const LOCK_RELEASE: &str = include_str!("lock_release.lua");

const POLL_MIN: Duration = Duration::from_millis(10);
const POLL_MAX: Duration = Duration::from_millis(100);

/// Lease lock shared by every instance talking to the same Redis.
/// `SET key owner NX PX lease` to take it, compare-and-delete to release.
pub struct RedisLock {
    conn: ConnectionManager,
    prefix: String,
    release: Script,
}

impl RedisLock {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisLock {
            conn,
            prefix: prefix.into(),
            release: Script::new(LOCK_RELEASE),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:lock:{}", self.prefix, key)
    }

    async fn try_take(&self, key: &str, owner: &str, lease: Duration) -> Result<bool, TokenError> {
        let mut conn = self.conn.clone();
        let lease_ms = lease.as_millis().max(1) as u64;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(owner)
            .arg("NX")
            .arg("PX")
            .arg(lease_ms)
            .query_async(&mut conn)
            .await
            .map_err(TokenError::store)?;
        Ok(reply.is_some())
    }
}

#[async_trait::async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        wait: Duration,
    ) -> Result<LockLease, TokenError> {
        let redis_key = self.key(key);
        let owner = nanoid!();
        let deadline = Instant::now() + wait;
        let mut backoff = POLL_MIN;

        loop {
            if self.try_take(&redis_key, &owner, lease).await? {
                return Ok(LockLease {
                    key: redis_key,
                    owner,
                    held_until: Utc::now() + lease,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TokenError::LockTimeout);
            }
            tokio::time::sleep(backoff.min(deadline - now)).await;
            backoff = (backoff * 2).min(POLL_MAX);
        }
    }

    async fn release(&self, lease: &LockLease) -> Result<(), TokenError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .release
            .key(&lease.key)
            .arg(&lease.owner)
            .invoke_async(&mut conn)
            .await
            .map_err(TokenError::store)?;
        Ok(())
    }
}
