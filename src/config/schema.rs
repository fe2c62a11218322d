//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the control
//! plane. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the control plane.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// API server settings.
    pub server: ServerConfig,

    /// Where the proxy config lives and how the proxy is reloaded.
    pub proxy: ProxyConfig,

    /// Registry endpoints that receive reload-all fan-out.
    pub registry: RegistryConfig,

    /// Discovery mode and instance identity.
    pub discovery: DiscoveryConfig,

    /// Peer fan-out timeouts and retries.
    pub propagation: PropagationConfig,

    /// Certificate storage.
    pub certs: CertConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes (certificate uploads).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Proxy process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path of the live proxy config file.
    pub config_path: String,

    /// Optional file holding the global/defaults header.
    pub header_template: Option<String>,

    /// Port the http frontend binds.
    pub http_port: u16,

    /// Port the https frontend binds when certificates exist.
    pub https_port: u16,

    /// Command triggering a graceful reload; `{config}` is replaced by the
    /// config path. None disables reloads.
    pub reload_command: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            config_path: "/cfg/haproxy.cfg".to_string(),
            header_template: None,
            http_port: 80,
            https_port: 443,
            reload_command: None,
        }
    }
}

/// Registry endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry base URLs. Entries may themselves be comma-separated.
    pub addresses: Vec<String>,

    /// Path appended to each registry base for reload-all calls.
    pub reload_all_path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            reload_all_path: "/v1/proxy/reload-all".to_string(),
        }
    }
}

/// Discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Discovery mode: default, service or swarm (case-insensitive).
    pub mode: String,

    /// Identity of this proxy instance.
    pub instance_name: String,

    /// Swarm listener host, optionally with scheme and port.
    pub listener_address: Option<String>,

    /// Path on the listener asked to re-send service notifications.
    pub listener_notify_path: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: "default".to_string(),
            instance_name: "proxy".to_string(),
            listener_address: None,
            listener_notify_path: "/v1/swarm-listener/notify-services".to_string(),
        }
    }
}

/// Peer propagation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Timeout for a single peer call in seconds.
    pub timeout_secs: u64,

    /// Attempts per peer, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Peers contacted at the same time.
    pub concurrency: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            concurrency: 8,
        }
    }
}

/// Certificate storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertConfig {
    /// Directory certificates are written to and bound from.
    pub dir: String,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            dir: "/certs".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ControlPlaneConfig = toml::from_str(
            r#"
            [discovery]
            mode = "swarm"
            listener_address = "swarm-listener"

            [registry]
            addresses = ["consul-1:8500", "consul-2:8500"]
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.mode, "swarm");
        assert_eq!(config.discovery.instance_name, "proxy");
        assert_eq!(config.registry.addresses.len(), 2);
        assert_eq!(config.propagation.max_attempts, 3);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }
}
