//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated config
//! - Initialize certificate storage before the first reload
//! - Run the initial full resync
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The API listener is bound by the caller, after the resync succeeds

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::certs::{CertError, CertificateGateway, FsCertStore};
use crate::config::ControlPlaneConfig;
use crate::discovery::mode::UnknownMode;
use crate::discovery::SystemLookup;
use crate::engine::{ReconfigureContext, ReconfigureEngine, ReconfigureError};
use crate::reload::{CommandProcess, FsConfigStore, HttpPeerNotifier, NoopProcess, ProxyProcess, ReloadCoordinator};
use crate::render::{TemplateRenderer, DEFAULT_HEADER};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Mode(#[from] UnknownMode),

    #[error("failed to read header template '{path}': {source}")]
    Header {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build peer client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("certificate store initialization failed: {0}")]
    Certificates(#[from] CertError),

    #[error("initial reload failed: {0}")]
    InitialReload(#[from] ReconfigureError),
}

/// Everything the API server and signal handlers share.
#[derive(Clone)]
pub struct Runtime {
    pub engine: Arc<ReconfigureEngine>,
    pub certs: Arc<dyn CertificateGateway>,
    pub context: ReconfigureContext,
}

fn header(config: &ControlPlaneConfig) -> Result<String, StartupError> {
    match config.proxy.header_template.as_deref() {
        Some(path) => std::fs::read_to_string(path).map_err(|source| StartupError::Header {
            path: path.to_string(),
            source,
        }),
        None => Ok(DEFAULT_HEADER.to_string()),
    }
}

/// Wire the engine's production seams from `config`.
pub fn build_engine(
    config: &ControlPlaneConfig,
    certs: Arc<dyn CertificateGateway>,
) -> Result<ReconfigureEngine, StartupError> {
    let process: Arc<dyn ProxyProcess> = match config.proxy.reload_command.as_deref() {
        Some(command) if !command.trim().is_empty() => Arc::new(CommandProcess::new(command)),
        _ => Arc::new(NoopProcess),
    };
    let notifier = HttpPeerNotifier::new(
        Duration::from_secs(config.propagation.timeout_secs.max(1)),
        config.registry.reload_all_path.clone(),
        config.discovery.listener_notify_path.clone(),
    )?;
    let coordinator = ReloadCoordinator::new(
        Arc::new(FsConfigStore::new(&config.proxy.config_path)),
        process,
        Arc::new(notifier),
    )
    .with_header(header(config)?)
    .with_propagation(&config.propagation);

    Ok(ReconfigureEngine::new(
        TemplateRenderer::from_config(&config.proxy),
        coordinator,
        certs,
        Arc::new(SystemLookup),
    ))
}

/// Build the runtime and apply the initial config.
pub async fn bootstrap(config: &ControlPlaneConfig) -> Result<Runtime, StartupError> {
    let context = ReconfigureContext::from_config(config)?;
    tracing::info!(
        instance = %context.instance_name,
        mode = %context.mode,
        peers = context.registry_addresses.len(),
        listener = ?context.listener_address,
        "Reconfiguration context ready"
    );

    let certs: Arc<dyn CertificateGateway> = Arc::new(FsCertStore::new(config.certs.dir.clone()));
    certs.init().await?;

    let engine = Arc::new(build_engine(config, certs.clone())?);
    match engine.reload(true, &context).await {
        Ok(report) => tracing::info!(
            reloaded = report.reloaded,
            peers = report.peers.len(),
            "Initial config applied"
        ),
        // Peers may still be starting; the local proxy is already live.
        Err(ReconfigureError::Propagation { outcomes }) => tracing::warn!(
            peers = outcomes.len(),
            "Initial config applied, no peer reachable"
        ),
        Err(e) => return Err(e.into()),
    }

    Ok(Runtime {
        engine,
        certs,
        context,
    })
}
