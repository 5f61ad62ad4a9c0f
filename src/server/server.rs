use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const GRANT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Wires the configured backends into a [`SessionService`].
pub struct Server {
    pub session_service: Arc<dyn SessionService>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let telemetry: Arc<dyn TokenTelemetry> = Arc::new(TracingTelemetry);

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.token.issuer.clone(),
            audience: settings.token.audience.clone(),
            signing_key: settings.token.signing_key.clone().into_bytes(),
        }));

        let (token_store, pool): (Arc<dyn TokenStore>, Option<Pool<MySql>>) =
            match (settings.backend.store.as_str(), &settings.mysql) {
                ("memory", _) => (Arc::new(MemoryTokenStore::new()), None),
                ("mysql", Some(mysql)) => {
                    let pool = Pool::<MySql>::connect(&mysql.dsn).await?;
                    (Arc::new(MySqlTokenStore::new(pool.clone())), Some(pool))
                }
                (other, _) => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
            };

        let (lock, cache): (Arc<dyn DistributedLock>, Arc<dyn ReplayCache>) =
            match (settings.backend.coordination.as_str(), &settings.redis) {
                ("memory", _) => (
                    Arc::new(LocalLock::new()),
                    Arc::new(MemoryReplayCache::new(clock.clone())),
                ),
                ("redis", Some(redis)) => {
                    let redis_client = redis::Client::open(redis.dsn.as_str())?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    (
                        Arc::new(RedisLock::new(redis_manager.clone(), redis.prefix.clone())),
                        Arc::new(RedisReplayCache::new(redis_manager, redis.prefix.clone())),
                    )
                }
                (other, _) => {
                    return Err(anyhow::anyhow!("Unknown coordination backend: {}", other));
                }
            };

        let config = SessionConfig {
            access_ttl: settings.token.access_ttl(),
            refresh_ttl: settings.token.refresh_ttl(),
            reset_ttl: settings.token.reset_ttl(),
            lock_lease: settings.rotation.lock_lease(),
            lock_wait: settings.rotation.lock_wait(),
            grace_window: settings.rotation.grace_window(),
        };

        let real_service = Arc::new(RealSessionService::assemble(
            token_codec,
            token_store,
            lock,
            cache,
            clock,
            telemetry,
            config,
        ));
        let session_service: Arc<dyn SessionService> = real_service.clone();

        let sweeper_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(GRANT_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = real_service.purge_expired_grants().await {
                    warn!(error = %e, "reset grant sweep failed");
                }
            }
        });

        info!(
            store = %settings.backend.store,
            coordination = %settings.backend.coordination,
            "server started"
        );

        Ok(Self {
            session_service,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Ok(mut lock) = self.sweeper_handle.lock() {
            if let Some(handle) = lock.take() {
                handle.abort();
                info!("grant sweeper stopped");
            }
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
