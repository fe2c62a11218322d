//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject unknown discovery modes before the engine starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControlPlaneConfig → Result<(), Vec<InvalidSetting>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ControlPlaneConfig;
use crate::discovery::DiscoveryMode;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidSetting {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &ControlPlaneConfig) -> Result<(), Vec<InvalidSetting>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(InvalidSetting::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(InvalidSetting::new("server.request_timeout_secs", "must be > 0"));
    }
    if config.proxy.config_path.trim().is_empty() {
        errors.push(InvalidSetting::new("proxy.config_path", "must not be empty"));
    }
    if config.proxy.http_port == 0 || config.proxy.https_port == 0 {
        errors.push(InvalidSetting::new("proxy.http_port", "ports must be > 0"));
    }
    if !config.registry.reload_all_path.starts_with('/') {
        errors.push(InvalidSetting::new("registry.reload_all_path", "must start with '/'"));
    }
    if let Err(e) = config.discovery.mode.parse::<DiscoveryMode>() {
        errors.push(InvalidSetting::new("discovery.mode", e.to_string()));
    }
    if config.discovery.instance_name.trim().is_empty() {
        errors.push(InvalidSetting::new("discovery.instance_name", "must not be empty"));
    }
    if config.propagation.timeout_secs == 0 {
        errors.push(InvalidSetting::new("propagation.timeout_secs", "must be > 0"));
    }
    if config.propagation.max_attempts == 0 {
        errors.push(InvalidSetting::new("propagation.max_attempts", "must be > 0"));
    }
    if config.propagation.concurrency == 0 {
        errors.push(InvalidSetting::new("propagation.concurrency", "must be > 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(InvalidSetting::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
