use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use todo_server::{app, run, AppState, MemoryBackend, OpenSearchBackend, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = ServerConfig::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let router = match &config.opensearch_url {
        Some(url) => {
            let backend = OpenSearchBackend::new(url, config.credentials())
                .context("Invalid OpenSearch URL")?;
            info!(%url, index = %config.index, "using OpenSearch backend");
            app(AppState::new(backend, &config.index), &config.base_path)
        }
        None => {
            info!("OPENSEARCH_URL not set, using in-memory backend");
            app(
                AppState::new(MemoryBackend::new(), &config.index),
                &config.base_path,
            )
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("listening on http://{addr}{}", config.base_path);

    run(listener, router, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
