//! routeplane: keeps a reverse proxy's routing config in sync with services.
//!
//! # Architecture Overview
//!
//! ```text
//!   API request (/v1/proxy/...)
//!        │
//!        ▼
//!   ┌─────────┐    ┌──────────────────────────────────────────────┐
//!   │  http   │───▶│                   engine                     │
//!   │ server  │    │  validate → discovery → render → reload      │
//!   └─────────┘    │          (one lock, one coherent snapshot)   │
//!                  └───────────────┬──────────────────────────────┘
//!                                  │
//!           ┌──────────────────────┼───────────────────────┐
//!           ▼                      ▼                       ▼
//!     proxy config file      proxy reload command     peers (registry
//!     (atomic replace)       (graceful)               reload-all or
//!                                                     swarm listener)
//!
//!   Cross-cutting: config · certs · observability · lifecycle · resilience
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use routeplane::config;
use routeplane::http::{ApiServer, AppState};
use routeplane::lifecycle::{bootstrap, signals, Shutdown};
use routeplane::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "routeplane", version)]
#[command(about = "Reverse proxy reconfiguration control plane", long_about = None)]
struct Args {
    /// TOML config file; defaults and environment are used when absent
    #[arg(short, long, env = "ROUTEPLANE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load(args.config.as_deref())?;

    logging::init_tracing(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "routeplane starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        config_path = %config.proxy.config_path,
        mode = %config.discovery.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(&config.observability.metrics_address)?;
    }

    let runtime = bootstrap(&config).await?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));
    let hangup = signals::spawn_reload_on_hangup(
        runtime.engine.clone(),
        runtime.context.clone(),
        shutdown.clone(),
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = ApiServer::new(&config.server, AppState::from(&runtime));
    server.run(listener, shutdown.wait()).await?;

    shutdown.trigger();
    let _ = hangup.await;
    tracing::info!("Shutdown complete");
    Ok(())
}
