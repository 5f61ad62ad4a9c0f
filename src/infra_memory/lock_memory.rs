use crate::application_port::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use nanoid::nanoid;
use std::time::Duration;
use tokio::time::Instant;

const POLL_MIN: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(50);

struct Held {
    owner: String,
    until: Instant,
}

/// Per-key mutex with leases for a single instance. An expired lease is
/// treated as free, which is what keeps a crashed holder from blocking the
/// key forever.
#[derive(Default)]
pub struct LocalLock {
    held: DashMap<String, Held>,
}

impl LocalLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_take(&self, key: &str, owner: &str, lease: Duration) -> bool {
        let now = Instant::now();
        let held = Held {
            owner: owner.to_string(),
            until: now + lease,
        };
        match self.held.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(held);
                true
            }
            Entry::Occupied(mut slot) if slot.get().until <= now => {
                slot.insert(held);
                true
            }
            Entry::Occupied(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl DistributedLock for LocalLock {
    async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        wait: Duration,
    ) -> Result<LockLease, TokenError> {
        let owner = nanoid!();
        let deadline = Instant::now() + wait;
        let mut backoff = POLL_MIN;

        loop {
            if self.try_take(key, &owner, lease) {
                return Ok(LockLease {
                    key: key.to_string(),
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
        self.held.remove_if(&lease.key, |_, held| held.owner == lease.owner);
        Ok(())
    }
}
