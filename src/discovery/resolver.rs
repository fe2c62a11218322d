//! Resolver strategies.
//!
//! # Responsibilities
//! - Turn a service's declared destinations into concrete endpoints
//! - Report how peer proxies converge in the chosen mode

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::discovery::lookup::HostLookup;
use crate::service::{Destination, Endpoint, Service};

/// How other proxy instances learn about a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// Every registry endpoint is asked to reload.
    Registry,
    /// The orchestrator informs every replica itself.
    Orchestrator,
    /// The swarm listener re-notifies every replica.
    Listener,
}

/// Name lookup for a service failed.
#[derive(Debug, Error)]
#[error("failed to resolve service '{service}': {cause}")]
pub struct ResolutionError {
    pub service: String,
    #[source]
    pub cause: io::Error,
}

/// Strategy that produces concrete endpoints for a service.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Return a copy of `service` with every destination's endpoints filled in.
    async fn resolve(&self, service: &Service) -> Result<Service, ResolutionError>;

    fn convergence(&self) -> Convergence;
}

/// Destinations are routed as declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

#[async_trait]
impl Resolver for DefaultResolver {
    async fn resolve(&self, service: &Service) -> Result<Service, ResolutionError> {
        Ok(fill(service, |dest| vec![named_endpoint(service, dest)]))
    }

    fn convergence(&self) -> Convergence {
        Convergence::Registry
    }
}

/// Backends sit behind the orchestrator's own service name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceResolver;

#[async_trait]
impl Resolver for ServiceResolver {
    async fn resolve(&self, service: &Service) -> Result<Service, ResolutionError> {
        Ok(fill(service, |dest| vec![named_endpoint(service, dest)]))
    }

    fn convergence(&self) -> Convergence {
        Convergence::Orchestrator
    }
}

/// Backends are the task IPs published in the orchestrator's DNS.
#[derive(Clone)]
pub struct SwarmResolver {
    lookup: Arc<dyn HostLookup>,
}

impl SwarmResolver {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Resolver for SwarmResolver {
    async fn resolve(&self, service: &Service) -> Result<Service, ResolutionError> {
        let needs_lookup = service.destinations.iter().any(|d| d.addresses.is_empty());
        if !needs_lookup {
            return Ok(fill(service, |_| Vec::new()));
        }

        let ips = self
            .lookup
            .lookup_host(&service.name)
            .await
            .map_err(|cause| ResolutionError {
                service: service.name.clone(),
                cause,
            })?;

        if ips.is_empty() {
            tracing::warn!(service = %service.name, "DNS returned no tasks, rendering an empty pool");
        } else {
            tracing::debug!(service = %service.name, tasks = ips.len(), "Resolved swarm tasks");
        }

        Ok(fill(service, |dest| {
            ips.iter()
                .map(|ip| Endpoint::new(ip.to_string(), dest.port.clone()))
                .collect()
        }))
    }

    fn convergence(&self) -> Convergence {
        Convergence::Listener
    }
}

/// Copy `service`, using declared addresses where present and `discover` otherwise.
fn fill<F>(service: &Service, discover: F) -> Service
where
    F: Fn(&Destination) -> Vec<Endpoint>,
{
    let mut resolved = service.clone();
    for dest in &mut resolved.destinations {
        dest.resolved = if dest.addresses.is_empty() {
            discover(dest)
        } else {
            dest.addresses.iter().map(|a| Endpoint::parse(a)).collect()
        };
    }
    resolved
}

fn named_endpoint(service: &Service, dest: &Destination) -> Endpoint {
    Endpoint::new(service.backend_host(), dest.port.clone())
}
