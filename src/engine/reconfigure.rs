//! The reconfiguration engine.
//!
//! # Responsibilities
//! - Own the known-service set and the last applied config
//! - Serialize every mutation behind one lock
//! - Run validate, resolve, render, write and reload inside it
//! - Propagate to peers after releasing it

use arc_swap::ArcSwap;
use futures_util::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::certs::CertificateGateway;
use crate::discovery::{Convergence, HostLookup, Resolver};
use crate::engine::context::ReconfigureContext;
use crate::engine::error::ReconfigureError;
use crate::observability::metrics;
use crate::reload::{PeerOutcome, ReloadCoordinator};
use crate::render::{TemplateRenderer, TlsBindings};
use crate::service::{validate, Service};

/// Outcome of a successful operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconfigureReport {
    /// Services known after the operation.
    pub services: usize,
    /// Whether the proxy was reloaded.
    pub reloaded: bool,
    /// One entry per peer contacted.
    pub peers: Vec<PeerOutcome>,
}

impl ReconfigureReport {
    /// Messages for peers that could not be reached.
    pub fn warnings(&self) -> Vec<String> {
        self.peers
            .iter()
            .filter_map(|p| {
                p.error
                    .as_ref()
                    .map(|e| format!("propagation to {} failed: {}", p.address, e))
            })
            .collect()
    }
}

#[derive(Default)]
struct EngineState {
    services: BTreeMap<String, Service>,
    last_applied: Option<String>,
}

/// Applies service changes to the local proxy and the rest of the fleet.
pub struct ReconfigureEngine {
    state: Mutex<EngineState>,
    snapshot: ArcSwap<Vec<Service>>,
    renderer: TemplateRenderer,
    coordinator: ReloadCoordinator,
    certs: Arc<dyn CertificateGateway>,
    lookup: Arc<dyn HostLookup>,
}

impl ReconfigureEngine {
    /// Create an engine with no known services.
    pub fn new(
        renderer: TemplateRenderer,
        coordinator: ReloadCoordinator,
        certs: Arc<dyn CertificateGateway>,
        lookup: Arc<dyn HostLookup>,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            snapshot: ArcSwap::from_pointee(Vec::new()),
            renderer,
            coordinator,
            certs,
            lookup,
        }
    }

    /// Add or replace `service`.
    pub async fn execute(
        &self,
        service: Service,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let name = service.name.clone();
        let result = self.execute_inner(service, ctx).await;
        record("reconfigure", &result);
        match &result {
            Ok(report) => tracing::info!(
                service = %name,
                mode = %ctx.mode,
                reloaded = report.reloaded,
                peers = report.peers.len(),
                "Service reconfigured"
            ),
            Err(e) => tracing::warn!(service = %name, error = %e, "Reconfiguration failed"),
        }
        result
    }

    async fn execute_inner(
        &self,
        service: Service,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let resolver = ctx.mode.resolver(self.lookup.clone());
        let report = {
            let mut state = self.state.lock().await;
            validate(&service, &state.services)?;
            let mut candidate = state.services.clone();
            candidate.insert(service.name.clone(), service);
            self.apply(&mut state, candidate, resolver.as_ref(), false)
                .await?
        };
        self.propagate(report, resolver.convergence(), ctx).await
    }

    /// Drop the service called `name`. Unknown names succeed without a reload.
    pub async fn remove(
        &self,
        name: &str,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let result = self.remove_inner(name, ctx).await;
        record("remove", &result);
        match &result {
            Ok(report) if report.reloaded => tracing::info!(service = %name, "Service removed"),
            Ok(_) => {}
            Err(e) => tracing::warn!(service = %name, error = %e, "Removal failed"),
        }
        result
    }

    async fn remove_inner(
        &self,
        name: &str,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let resolver = ctx.mode.resolver(self.lookup.clone());
        let report = {
            let mut state = self.state.lock().await;
            if !state.services.contains_key(name) {
                tracing::debug!(service = %name, "Remove requested for unknown service");
                return Ok(ReconfigureReport {
                    services: state.services.len(),
                    ..Default::default()
                });
            }
            let mut candidate = state.services.clone();
            candidate.remove(name);
            self.apply(&mut state, candidate, resolver.as_ref(), false)
                .await?
        };
        self.propagate(report, resolver.convergence(), ctx).await
    }

    /// Re-render and reload every known service, then propagate.
    pub async fn reload(
        &self,
        recreate: bool,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let resolver = ctx.mode.resolver(self.lookup.clone());
        let result = match self.resync(recreate, resolver.as_ref()).await {
            Ok(report) => self.propagate(report, resolver.convergence(), ctx).await,
            Err(e) => Err(e),
        };
        record("reload", &result);
        if let Err(e) = &result {
            tracing::warn!(recreate, error = %e, "Reload failed");
        }
        result
    }

    /// Re-render and reload every known service without contacting peers.
    ///
    /// Used when a peer asks this instance to reload, so requests never echo.
    pub async fn reload_local(
        &self,
        recreate: bool,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let resolver = ctx.mode.resolver(self.lookup.clone());
        let result = self.resync(recreate, resolver.as_ref()).await;
        record("reload_local", &result);
        result
    }

    /// Lock-free view of the known services, sorted by name.
    pub fn services(&self) -> Arc<Vec<Service>> {
        self.snapshot.load_full()
    }

    /// The config currently on disk.
    pub async fn current_config(&self) -> std::io::Result<String> {
        self.coordinator.current().await
    }

    /// True while another operation holds the engine lock.
    #[cfg(test)]
    pub(crate) fn is_busy(&self) -> bool {
        self.state.try_lock().is_err()
    }

    async fn resync(
        &self,
        recreate: bool,
        resolver: &dyn Resolver,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let mut state = self.state.lock().await;
        let candidate = state.services.clone();
        self.apply(&mut state, candidate, resolver, recreate).await
    }

    /// Resolve, render, write and reload `candidate`, committing it on success.
    async fn apply(
        &self,
        state: &mut EngineState,
        candidate: BTreeMap<String, Service>,
        resolver: &dyn Resolver,
        recreate: bool,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let resolved = try_join_all(candidate.values().map(|s| resolver.resolve(s))).await?;

        let bundle = self.certs.get_all().await?;
        let tls = TlsBindings::from_certs(self.certs.certs_dir(), bundle.len());
        let rendered = self.renderer.render(&resolved, &tls)?;

        let applied = self
            .coordinator
            .apply(&rendered, recreate, state.last_applied.as_deref())
            .await?;

        state.services = candidate;
        state.last_applied = Some(applied.config);
        self.snapshot
            .store(Arc::new(state.services.values().cloned().collect()));
        metrics::set_known_services(state.services.len());

        Ok(ReconfigureReport {
            services: state.services.len(),
            reloaded: applied.reloaded,
            peers: Vec::new(),
        })
    }

    async fn propagate(
        &self,
        mut report: ReconfigureReport,
        convergence: Convergence,
        ctx: &ReconfigureContext,
    ) -> Result<ReconfigureReport, ReconfigureError> {
        let peers = self.coordinator.propagate(convergence, ctx).await;
        if !peers.is_empty() && peers.iter().all(|p| !p.is_ok()) {
            return Err(ReconfigureError::Propagation { outcomes: peers });
        }
        report.peers = peers;
        for warning in report.warnings() {
            tracing::warn!(warning = %warning, "Partial propagation");
        }
        Ok(report)
    }
}

fn record(operation: &'static str, result: &Result<ReconfigureReport, ReconfigureError>) {
    let outcome = match result {
        Ok(report) if report.warnings().is_empty() => "ok",
        Ok(_) => "partial",
        Err(e) => e.kind(),
    };
    metrics::record_reconfigure(operation, outcome);
}
