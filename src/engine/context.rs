//! Per-call reconfiguration context.

use serde::Serialize;

use crate::config::ControlPlaneConfig;
use crate::discovery::mode::UnknownMode;
use crate::discovery::DiscoveryMode;

/// Port the swarm listener serves on when the address names none.
pub const LISTENER_PORT: u16 = 8080;

/// Where peers live and how this instance identifies itself to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconfigureContext {
    /// Normalized registry base URLs.
    pub registry_addresses: Vec<String>,
    pub instance_name: String,
    pub mode: DiscoveryMode,
    /// Listener URL derived from the configured listener address.
    pub listener_address: Option<String>,
}

impl ReconfigureContext {
    pub fn new(instance_name: impl Into<String>, mode: DiscoveryMode) -> Self {
        Self {
            registry_addresses: Vec::new(),
            instance_name: instance_name.into(),
            mode,
            listener_address: None,
        }
    }

    pub fn from_config(config: &ControlPlaneConfig) -> Result<Self, UnknownMode> {
        let mode: DiscoveryMode = config.discovery.mode.parse()?;
        let joined = config.registry.addresses.join(",");
        let mut ctx = Self::new(config.discovery.instance_name.clone(), mode)
            .with_registry_addresses(&joined);
        if let Some(listener) = config.discovery.listener_address.as_deref() {
            ctx = ctx.with_listener(listener);
        }
        Ok(ctx)
    }

    /// Replace the peer list with the normalized form of a comma-separated list.
    pub fn with_registry_addresses(mut self, raw: &str) -> Self {
        self.registry_addresses = normalize_addresses(raw);
        self
    }

    pub fn with_listener(mut self, raw: &str) -> Self {
        self.listener_address = listener_url(raw);
        self
    }
}

fn with_scheme(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Split a comma-separated registry list into base URLs.
///
/// Entries are trimmed, empty ones dropped, and `http://` is prefixed when
/// no scheme is present. Duplicates keep their first position.
pub fn normalize_addresses(raw: &str) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for address in raw.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let address = with_scheme(address);
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    addresses
}

/// Derive the swarm listener URL from a host, `host:port` or full URL.
pub fn listener_url(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_end_matches('/');
    if raw.is_empty() {
        return None;
    }
    if raw.contains("://") {
        return Some(raw.to_string());
    }
    let has_port = raw
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()));
    if has_port {
        Some(with_scheme(raw))
    } else {
        Some(format!("http://{}:{}", raw, LISTENER_PORT))
    }
}
