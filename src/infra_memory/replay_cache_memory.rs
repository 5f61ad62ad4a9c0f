use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// every this many inserts, `put` also drops expired entries
const SWEEP_EVERY: usize = 64;

/// Entries stay readable up to and including their expiry instant.
pub struct MemoryReplayCache {
    entries: DashMap<TokenId, (TokenPair, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
    inserts: AtomicUsize,
}

impl MemoryReplayCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries. Reads already ignore them; this only bounds memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires_at)| *expires_at >= now);
        before - self.entries.len()
    }
}

#[async_trait::async_trait]
impl ReplayCache for MemoryReplayCache {
    async fn get(&self, token_id: TokenId) -> Result<Option<TokenPair>, TokenError> {
        let now = self.clock.now();
        let hit = self
            .entries
            .get(&token_id)
            .filter(|entry| entry.1 >= now)
            .map(|entry| entry.0.clone());
        Ok(hit)
    }

    async fn put(
        &self,
        token_id: TokenId,
        pair: &TokenPair,
        ttl: Duration,
    ) -> Result<(), TokenError> {
        if (self.inserts.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            let purged = self.purge_expired();
            tracing::debug!(purged, "swept replay cache");
        }
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(token_id, (pair.clone(), expires_at));
        Ok(())
    }
}
