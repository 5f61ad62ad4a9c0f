use anyhow::{Result, anyhow};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

pub struct LogConfig {
    pub filter: String,
}

impl From<&crate::settings::Log> for LogConfig {
    fn from(log: &crate::settings::Log) -> Self {
        LogConfig {
            filter: log.filter.clone(),
        }
    }
}

/// Installs the global subscriber at `info`; `reload_from_config` later swaps
/// in the configured filter. The format is fixed at install time, so the
/// binary installs the logger once `log.format` is known.
pub struct Logger {
    reload_handle: reload::Handle<EnvFilter, Registry>,
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        Self::install(false)
    }

    /// Like `new_bootstrap`, with the single-line compact formatter.
    pub fn new_compact() -> Self {
        Self::install(true)
    }

    fn install(compact: bool) -> Self {
        let (filter, reload_handle) = reload::Layer::new(EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        if compact {
            registry.with(fmt::layer().compact()).init();
        } else {
            registry.with(fmt::layer()).init();
        }

        Self { reload_handle }
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(&config.filter).map_err(|e| anyhow!(e))?;
        self.reload_handle.reload(filter).map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
