//! OS signal handling.
//!
//! # Responsibilities
//! - SIGTERM and SIGINT trigger graceful shutdown
//! - SIGHUP re-renders and reloads every known service
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A SIGHUP resync never contacts peers

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::engine::{ReconfigureContext, ReconfigureEngine};
use crate::lifecycle::shutdown::Shutdown;

/// Wait for ctrl-c or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Interrupt received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }
    shutdown.trigger();
}

/// Resync the proxy on every SIGHUP until shutdown.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(
    engine: Arc<ReconfigureEngine>,
    ctx: ReconfigureContext,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGHUP");
                return;
            }
        };
        let mut stop = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = stop.recv() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading proxy config");
                    if let Err(e) = engine.reload_local(true, &ctx).await {
                        tracing::error!(error = %e, "Reload on SIGHUP failed");
                    }
                }
            }
        }
    })
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(
    _engine: Arc<ReconfigureEngine>,
    _ctx: ReconfigureContext,
    _shutdown: Shutdown,
) -> JoinHandle<()> {
    tokio::spawn(async {})
}
