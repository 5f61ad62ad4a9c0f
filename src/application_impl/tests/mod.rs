//! Shared fixtures for the session component tests.

mod rotation_tests;

use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(super) fn config() -> SessionConfig {
    SessionConfig {
        access_ttl: Duration::from_secs(60 * 60),
        refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        reset_ttl: Duration::from_secs(15 * 60),
        lock_lease: Duration::from_secs(3),
        lock_wait: Duration::from_secs(2),
        grace_window: Duration::from_secs(3),
    }
}

/// Memory store that counts installs and can be told to fail. It keeps the
/// trait's default `replace`, so rotations go through put-then-delete.
#[derive(Default)]
pub(super) struct CountingStore {
    pub inner: MemoryTokenStore,
    pub puts: AtomicUsize,
    pub fail_puts: AtomicBool,
    pub fail_next_delete: AtomicBool,
    pub fail_delete_all: AtomicBool,
    /// Revoke the subject's lineages right before the next install, as a
    /// logout landing between validation and commit would.
    pub logout_before_next_put: AtomicBool,
}

#[async_trait::async_trait]
impl TokenStore for CountingStore {
    async fn put(&self, record: TokenPairRecord) -> Result<(), TokenError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(TokenError::StoreFailure("injected put failure".to_string()));
        }
        if self.logout_before_next_put.swap(false, Ordering::SeqCst) {
            self.inner.delete_all_for_subject(record.subject).await?;
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(record).await
    }

    async fn find_by_access(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        self.inner.find_by_access(token_id).await
    }

    async fn find_by_refresh(
        &self,
        token_id: TokenId,
    ) -> Result<Option<TokenPairRecord>, TokenError> {
        self.inner.find_by_refresh(token_id).await
    }

    async fn delete_by_refresh(&self, token_id: TokenId) -> Result<bool, TokenError> {
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(TokenError::StoreFailure("injected delete failure".to_string()));
        }
        self.inner.delete_by_refresh(token_id).await
    }

    async fn delete_all_for_subject(&self, subject: Subject) -> Result<usize, TokenError> {
        if self.fail_delete_all.load(Ordering::SeqCst) {
            return Err(TokenError::StoreFailure("injected delete_all failure".to_string()));
        }
        self.inner.delete_all_for_subject(subject).await
    }

    async fn put_reset_grant(&self, grant: ResetGrant) -> Result<(), TokenError> {
        self.inner.put_reset_grant(grant).await
    }

    async fn find_reset_grant(&self, token_id: TokenId) -> Result<Option<ResetGrant>, TokenError> {
        self.inner.find_reset_grant(token_id).await
    }

    async fn take_reset_grant(&self, token_id: TokenId) -> Result<bool, TokenError> {
        self.inner.take_reset_grant(token_id).await
    }

    async fn delete_expired_reset_grants(&self, now: DateTime<Utc>) -> Result<usize, TokenError> {
        self.inner.delete_expired_reset_grants(now).await
    }
}

/// Replay cache whose every call fails.
#[derive(Default)]
pub(super) struct BrokenCache {
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

#[async_trait::async_trait]
impl ReplayCache for BrokenCache {
    async fn get(&self, _token_id: TokenId) -> Result<Option<TokenPair>, TokenError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(TokenError::StoreFailure("cache unreachable".to_string()))
    }

    async fn put(
        &self,
        _token_id: TokenId,
        _pair: &TokenPair,
        _ttl: Duration,
    ) -> Result<(), TokenError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(TokenError::StoreFailure("cache unreachable".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingTelemetry {
    pub events: Mutex<Vec<TelemetryEvent>>,
}

impl TokenTelemetry for RecordingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub(super) struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<CountingStore>,
    pub lock: Arc<LocalLock>,
    pub cache: Arc<MemoryReplayCache>,
    pub codec: Arc<JwtHs256Codec>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub service: Arc<RealSessionService>,
}

pub(super) fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::build(config, None)
    }

    /// The service talks to `cache` instead of `Fixture::cache`.
    pub fn with_cache(cache: Arc<dyn ReplayCache>) -> Self {
        Self::build(config(), Some(cache))
    }

    fn build(config: SessionConfig, service_cache: Option<Arc<dyn ReplayCache>>) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let store = Arc::new(CountingStore::default());
        let lock = Arc::new(LocalLock::new());
        let cache = Arc::new(MemoryReplayCache::new(clock.clone()));
        let codec = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "tokenvault.test".to_string(),
            audience: "test-client".to_string(),
            signing_key: b"test-signing-key".to_vec(),
        }));
        let telemetry = Arc::new(RecordingTelemetry::default());
        let service = Arc::new(RealSessionService::assemble(
            codec.clone(),
            store.clone(),
            lock.clone(),
            service_cache.unwrap_or_else(|| cache.clone() as Arc<dyn ReplayCache>),
            clock.clone(),
            telemetry.clone(),
            config,
        ));

        Self {
            clock,
            store,
            lock,
            cache,
            codec,
            telemetry,
            service,
        }
    }

    pub fn subject() -> Subject {
        Subject(uuid::Uuid::new_v4())
    }

    pub fn claim_of(&self, token: &str) -> Claim {
        self.codec.decode(token).unwrap()
    }

    pub fn puts(&self) -> usize {
        self.store.puts.load(Ordering::SeqCst)
    }
}
