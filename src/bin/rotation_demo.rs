//! Issues a session against the in-memory backends and fires several
//! concurrent refreshes with the same refresh token.
//!
//! $ cargo run --bin rotation_demo

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokenvault::application_impl::*;
use tokenvault::application_port::*;
use tokenvault::domain_model::*;
use tokenvault::domain_port::*;
use tokenvault::infra_memory::*;
use tokenvault::logger::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_compact();
    logger.reload_from_config(&LogConfig {
        filter: "tokenvault=debug".to_string(),
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(MemoryTokenStore::new());
    let service: Arc<dyn SessionService> = Arc::new(RealSessionService::assemble(
        Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "tokenvault".to_string(),
            audience: "demo".to_string(),
            signing_key: b"demo-key".to_vec(),
        })),
        store.clone(),
        Arc::new(LocalLock::new()),
        Arc::new(MemoryReplayCache::new(clock.clone())),
        clock,
        Arc::new(TracingTelemetry),
        SessionConfig {
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(600),
            reset_ttl: Duration::from_secs(300),
            lock_lease: Duration::from_secs(3),
            lock_wait: Duration::from_secs(2),
            grace_window: Duration::from_secs(3),
        },
    ));

    let subject = Subject(uuid::Uuid::new_v4());
    let first = service.issue(subject).await?;

    let refreshes = (0..8).map(|_| {
        let service = service.clone();
        let token = first.refresh_token.0.clone();
        tokio::spawn(async move { service.refresh(&token).await })
    });

    let mut pairs = Vec::new();
    for joined in join_all(refreshes).await {
        pairs.push(joined??);
    }

    let identical = pairs.windows(2).all(|w| w[0] == w[1]);
    info!(
        callers = pairs.len(),
        identical,
        live_records = store.records_for(subject).len(),
        "concurrent refresh finished"
    );

    let revoked = service.logout(subject).await?;
    info!(revoked, "logged out");

    match service.refresh(&first.refresh_token.0).await {
        Err(e) => info!(kind = e.kind(), "replay after logout rejected"),
        Ok(_) => warn!("replay after logout unexpectedly succeeded"),
    }

    Ok(())
}
