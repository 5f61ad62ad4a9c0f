use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub token: Token,
    pub rotation: Rotation,
    pub backend: Backend,
    pub mysql: Option<MySql>,
    pub redis: Option<Redis>,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub issuer: String,
    pub audience: String,
    pub signing_key: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub reset_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Rotation {
    pub lock_lease_ms: u64,
    pub lock_wait_ms: u64,
    pub grace_window_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Backend {
    pub store: String,        // "memory" or "mysql"
    pub coordination: String, // "memory" or "redis"
}

#[derive(Debug, Deserialize)]
pub struct MySql {
    pub dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
    #[serde(default = "default_log_format")]
    pub format: String, // "full" or "compact"
}

fn default_log_format() -> String {
    "full".to_string()
}

impl Token {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_ttl_secs)
    }
}

impl Rotation {
    pub fn lock_lease(&self) -> Duration {
        Duration::from_millis(self.lock_lease_ms)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("token.access_ttl_secs", self.token.access_ttl_secs),
            ("token.refresh_ttl_secs", self.token.refresh_ttl_secs),
            ("token.reset_ttl_secs", self.token.reset_ttl_secs),
            ("rotation.lock_lease_ms", self.rotation.lock_lease_ms),
            ("rotation.lock_wait_ms", self.rotation.lock_wait_ms),
            ("rotation.grace_window_ms", self.rotation.grace_window_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                bail!("{field} must be positive");
            }
        }
        if self.token.signing_key.is_empty() {
            bail!("token.signing_key must not be empty");
        }
        match self.backend.store.as_str() {
            "memory" => {}
            "mysql" if self.mysql.is_some() => {}
            "mysql" => bail!("backend.store = \"mysql\" needs a [mysql] section"),
            other => bail!("unknown backend.store: {other}"),
        }
        match self.backend.coordination.as_str() {
            "memory" => {}
            "redis" if self.redis.is_some() => {}
            "redis" => bail!("backend.coordination = \"redis\" needs a [redis] section"),
            other => bail!("unknown backend.coordination: {other}"),
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("TOKENVAULT")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
