use crate::application_impl::TokenValidator;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
    pub lock_lease: Duration,
    pub lock_wait: Duration,
    pub grace_window: Duration,
}

/// Issues lineages and rotates refresh tokens exactly once per token.
///
/// `rotate` runs the same cache probe before and after taking the per-subject
/// lock. Only the lock holder validates, mints and commits, so concurrent
/// callers presenting the same refresh token all see the single pair the
/// holder cached.
pub struct RotationCoordinator {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn TokenStore>,
    lock: Arc<dyn DistributedLock>,
    cache: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
    validator: Arc<TokenValidator>,
    config: SessionConfig,
}

impl RotationCoordinator {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn TokenStore>,
        lock: Arc<dyn DistributedLock>,
        cache: Arc<dyn ReplayCache>,
        clock: Arc<dyn Clock>,
        validator: Arc<TokenValidator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            codec,
            store,
            lock,
            cache,
            clock,
            validator,
            config,
        }
    }

    pub async fn issue(&self, subject: Subject) -> Result<TokenPair, TokenError> {
        let (record, pair) = self.mint_pair(subject)?;
        let pair_id = record.pair_id;
        self.store.put(record).await?;
        info!(%subject, %pair_id, "issued session lineage");
        Ok(pair)
    }

    pub async fn rotate(&self, old_refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claim = self.codec.decode(old_refresh_token)?;

        if let Some(pair) = self.probe_cache(claim.token_id).await? {
            debug!(token_id = %claim.token_id, "rotation replayed before lock");
            return Ok(pair);
        }

        let lease = self
            .lock
            .acquire(
                &lock_key(claim.subject),
                self.config.lock_lease,
                self.config.lock_wait,
            )
            .await?;

        let result = self.rotate_locked(&claim).await;

        if let Err(e) = self.lock.release(&lease).await {
            warn!(key = %lease.key, error = %e, "lock release failed, lease expiry will free it");
        }

        result
    }

    async fn rotate_locked(&self, claim: &Claim) -> Result<TokenPair, TokenError> {
        if let Some(pair) = self.probe_cache(claim.token_id).await? {
            debug!(token_id = %claim.token_id, "rotation replayed under lock");
            return Ok(pair);
        }

        self.validator.check(claim, TokenType::Refresh).await?;

        let (record, pair) = self.mint_pair(claim.subject)?;
        let pair_id = record.pair_id;
        self.store.replace(claim.token_id, record).await?;

        if let Err(e) = self
            .cache
            .put(claim.token_id, &pair, self.config.grace_window)
            .await
        {
            warn!(token_id = %claim.token_id, error = %e, "replay cache populate failed");
        }

        info!(subject = %claim.subject, %pair_id, "rotated refresh token");
        Ok(pair)
    }

    /// A cache hit is only served while the pair it names is still live, so a
    /// logout inside the grace window also stops replays.
    async fn probe_cache(&self, token_id: TokenId) -> Result<Option<TokenPair>, TokenError> {
        let pair = match self.cache.get(token_id).await {
            Ok(Some(pair)) => pair,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(%token_id, error = %e, "replay cache probe failed, treating as miss");
                return Ok(None);
            }
        };

        let successor = match self.codec.decode(&pair.refresh_token.0) {
            Ok(claim) => claim,
            Err(_) => {
                warn!(%token_id, "replay cache entry is not a valid pair, treating as miss");
                return Ok(None);
            }
        };

        match self.store.find_by_refresh(successor.token_id).await? {
            Some(_) => Ok(Some(pair)),
            None => Err(TokenError::Revoked),
        }
    }

    fn mint_pair(&self, subject: Subject) -> Result<(TokenPairRecord, TokenPair), TokenError> {
        let now = self.clock.now();
        let access = Claim::mint(subject, TokenType::Access, now, self.config.access_ttl);
        let refresh = Claim::mint(subject, TokenType::Refresh, now, self.config.refresh_ttl);

        let pair = TokenPair {
            access_token: AccessToken(self.codec.encode(&access)?),
            refresh_token: RefreshToken(self.codec.encode(&refresh)?),
            access_token_expires_at: access.expires_at,
            refresh_token_expires_at: refresh.expires_at,
        };
        let record = TokenPairRecord {
            pair_id: PairId::generate(),
            subject,
            access_token_id: access.token_id,
            refresh_token_id: refresh.token_id,
            created_at: access.issued_at,
        };

        Ok((record, pair))
    }
}

fn lock_key(subject: Subject) -> String {
    format!("rotate:{}", subject)
}
