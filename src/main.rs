//! event-hub - realtime connection hub for sentinels.
//!
//! Listens for sentinel WebSocket connections on `/ws` and answers liveness
//! probes on `/healthz`.

use clap::Parser as ClapParser;
use event_hub::{
    api::{self, AppState},
    config::HubConfig,
    registry::ConnectionRegistry,
};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// event-hub - realtime connection hub for sentinels
#[derive(ClapParser, Debug)]
#[command(name = "event-hub", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: HubConfig,
}

#[derive(Error, Debug)]
pub enum HubError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), HubError> {
    let cli = Cli::parse();
    init_tracing();

    let bind = cli.config.bind_addr();
    let state = AppState {
        registry: ConnectionRegistry::new(),
    };
    if cli.config.allowed_origins.is_empty() {
        tracing::info!("origin check disabled; accepting upgrades from any origin");
    }
    let app = api::router(state, cli.config.router_config());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %bind, path = api::CONNECT_PATH, "event hub listening");

    // Sessions are not drained; they end when the process exits.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("received Ctrl+C"),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
                    std::future::pending::<()>().await
                }
            }
        })
        .await?;

    tracing::info!("event hub exiting");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "event_hub=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
