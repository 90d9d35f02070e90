use anyhow::Context;
use record_service::config::AppConfig;
use record_service::server::{app, serve};
use record_service::storage::selector::select_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // 1. Storage backend (decided once, logged by the selector):
    let store = select_store(&config.store).await;

    // 2. HTTP Router with a per-request deadline:
    let app = app(store.clone(), config.request_timeout);

    // 3. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Starting record API server on {}", config.bind_addr);

    // 4. Serve until Ctrl+C/SIGTERM, then drain within the shutdown bound:
    serve(listener, app, shutdown_signal(), config.shutdown_timeout).await?;

    // 5. Release our handle on the store. An etcd client closes once connections left open
    //    past a forced shutdown have also let go of theirs.
    drop(store);

    tracing::info!("Server exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
