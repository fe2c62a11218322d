//! Write, reload and propagate a rendered config.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PropagationConfig;
use crate::discovery::Convergence;
use crate::engine::{ReconfigureContext, ReconfigureError};
use crate::observability::metrics;
use crate::reload::process::ProxyProcess;
use crate::reload::propagation::{PeerError, PeerNotifier, PeerOutcome, ReloadAllRequest};
use crate::reload::store::ConfigStore;
use crate::render::{compose, RenderedConfig, DEFAULT_HEADER};
use crate::resilience::{retry_with_backoff, with_deadline, RetryPolicy};

/// What `apply` left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Full composed config now live.
    pub config: String,
    /// False when the content was unchanged and the reload was skipped.
    pub reloaded: bool,
}

/// Drives one render through the write and reload steps, then fans out.
pub struct ReloadCoordinator {
    store: Arc<dyn ConfigStore>,
    process: Arc<dyn ProxyProcess>,
    notifier: Arc<dyn PeerNotifier>,
    header: String,
    retry: RetryPolicy,
    peer_timeout: Duration,
    concurrency: usize,
}

impl ReloadCoordinator {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        process: Arc<dyn ProxyProcess>,
        notifier: Arc<dyn PeerNotifier>,
    ) -> Self {
        Self {
            store,
            process,
            notifier,
            header: DEFAULT_HEADER.to_string(),
            retry: RetryPolicy::once(),
            peer_timeout: Duration::from_secs(5),
            concurrency: 8,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_propagation(mut self, config: &PropagationConfig) -> Self {
        self.retry = RetryPolicy::from_config(config);
        self.peer_timeout = Duration::from_secs(config.timeout_secs.max(1));
        self.concurrency = config.concurrency.max(1);
        self
    }

    /// Read the live config back.
    pub async fn current(&self) -> std::io::Result<String> {
        self.store.read().await
    }

    /// Persist `rendered` and reload the proxy.
    ///
    /// With `recreate == false` an output identical to `last_applied` is
    /// neither written nor reloaded. A failed reload puts the previous file
    /// content back before returning the error.
    pub async fn apply(
        &self,
        rendered: &RenderedConfig,
        recreate: bool,
        last_applied: Option<&str>,
    ) -> Result<Applied, ReconfigureError> {
        let config = compose(&self.header, rendered);
        if !recreate && last_applied == Some(config.as_str()) {
            tracing::debug!("Rendered config unchanged, skipping reload");
            return Ok(Applied {
                config,
                reloaded: false,
            });
        }

        let previous = match self.store.read().await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read current config, rollback unavailable");
                None
            }
        };

        self.store
            .write(&config)
            .await
            .map_err(ReconfigureError::Write)?;

        let location = self.store.location();
        let started = Instant::now();
        let reloaded = self.process.reload(location).await;
        metrics::record_reload(started.elapsed(), reloaded.is_ok());

        if let Err(e) = reloaded {
            tracing::error!(error = %e, config = %location.display(), "Proxy reload failed");
            match previous {
                Some(previous) => {
                    if let Err(restore) = self.store.write(&previous).await {
                        tracing::error!(error = %restore, "Failed to restore previous config");
                    }
                }
                None => tracing::warn!("No previous config to restore"),
            }
            return Err(ReconfigureError::Reload(e));
        }

        tracing::info!(config = %location.display(), bytes = config.len(), "Proxy reloaded");
        Ok(Applied {
            config,
            reloaded: true,
        })
    }

    /// Tell the rest of the fleet about a change, as `convergence` requires.
    pub async fn propagate(
        &self,
        convergence: Convergence,
        ctx: &ReconfigureContext,
    ) -> Vec<PeerOutcome> {
        match convergence {
            Convergence::Registry => self.reload_registry_peers(ctx).await,
            Convergence::Orchestrator => Vec::new(),
            Convergence::Listener => match ctx.listener_address.as_deref() {
                Some(listener) => vec![self.notify_listener(listener).await],
                None => {
                    tracing::debug!("No listener address configured, skipping notification");
                    Vec::new()
                }
            },
        }
    }

    async fn call_peer<F, Fut>(&self, mut call: F) -> Result<(), PeerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), PeerError>>,
    {
        let timeout = self.peer_timeout;
        retry_with_backoff(self.retry, |_| {
            let fut = call();
            async move { with_deadline(timeout, fut).await? }
        })
        .await
    }

    async fn reload_registry_peers(&self, ctx: &ReconfigureContext) -> Vec<PeerOutcome> {
        let request = ReloadAllRequest {
            instance_name: ctx.instance_name.clone(),
            mode: ctx.mode,
            listener_address: ctx.listener_address.clone(),
        };
        let request = &request;

        let calls: Vec<_> = ctx
            .registry_addresses
            .iter()
            .enumerate()
            .map(|(index, address)| async move {
                let result = self
                    .call_peer(|| self.notifier.reload_all(address, request))
                    .await;
                metrics::record_propagation("registry", result.is_ok());
                let outcome = match result {
                    Ok(()) => PeerOutcome::ok(address.as_str()),
                    Err(e) => {
                        tracing::warn!(peer = %address, error = %e, "Peer reload failed");
                        PeerOutcome::failed(address.as_str(), e)
                    }
                };
                (index, outcome)
            })
            .collect();

        let mut outcomes: Vec<(usize, PeerOutcome)> = stream::iter(calls)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<PeerOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();
        tracing::info!(
            peers = outcomes.len(),
            failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
            "Registry peers notified"
        );
        outcomes
    }

    async fn notify_listener(&self, listener: &str) -> PeerOutcome {
        let result = self
            .call_peer(|| self.notifier.notify_listener(listener))
            .await;
        metrics::record_propagation("listener", result.is_ok());
        match result {
            Ok(()) => {
                tracing::info!(listener = %listener, "Swarm listener notified");
                PeerOutcome::ok(listener)
            }
            Err(e) => {
                tracing::warn!(listener = %listener, error = %e, "Swarm listener notification failed");
                PeerOutcome::failed(listener, e)
            }
        }
    }
}
