use crate::application_port::*;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Proof of holding a lock. `owner` is unique per acquisition so that a
/// release after lease expiry cannot free somebody else's lock.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LockLease {
    pub key: String,
    pub owner: String,
    pub held_until: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait DistributedLock: Send + Sync {
    /// Wait up to `wait` for the lock on `key`; hold it for at most `lease`.
    /// Fails with `LockTimeout` when the wait runs out.
    async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        wait: Duration,
    ) -> Result<LockLease, TokenError>;

    async fn release(&self, lease: &LockLease) -> Result<(), TokenError>;
}
