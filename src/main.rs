use std::sync::Arc;
use tokenvault::api;
use tokenvault::logger::*;
use tokenvault::server::*;
use tokenvault::settings::*;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Parsed before the logger is installed: the format is picked from it.
    let project_settings = parse_settings(cli.settings.as_deref())?;

    let logger = match project_settings.log.format.as_str() {
        "compact" => Logger::new_compact(),
        _ => Logger::new_bootstrap(),
    };
    // The full settings carry the signing key.
    info!(
        address = %project_settings.http.address,
        store = %project_settings.backend.store,
        coordination = %project_settings.backend.coordination,
        filter = %project_settings.log.filter,
        "settings loaded"
    );
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = api::v1::api(server.session_service.clone());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("could not register SIGINT: {}", e);
        }
    };

    match (
        &project_settings.http.cert_path,
        &project_settings.http.key_path,
    ) {
        (Some(cert_path), Some(key_path)) => {
            warp::serve(api_v1)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await;
        }
        _ => {
            let (bound, serving) = warp::serve(api_v1).bind_with_graceful_shutdown(address, shutdown);
            info!(%bound, "listening");
            serving.await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(30);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}
