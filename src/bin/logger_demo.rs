use tokenvault::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_compact();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "tokenvault=debug,warn".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!(target: "tokenvault", "application debug log");
    info!(target: "tokenvault", "application info log");
    warn!("other crates still log warnings");

    Ok(())
}
