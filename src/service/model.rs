//! Routable service values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use crate::service::validation::ValidationError;

/// How the proxy forwards traffic for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    #[default]
    Http,
    Tcp,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Http => "http",
            RequestMode::Tcp => "tcp",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "http" => Ok(RequestMode::Http),
            "tcp" => Ok(RequestMode::Tcp),
            other => Err(ValidationError::new(
                "reqMode",
                format!("unknown request mode '{}'", other),
            )),
        }
    }
}

/// A concrete backend address produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: Option<String>,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a declared `host:port` (or bare host) address. IPv6 hosts may be
    /// bracketed (`[fe80::1]:8080`).
    pub fn parse(address: &str) -> Self {
        let address = address.trim();
        if address.parse::<Ipv6Addr>().is_ok() {
            return Self::new(address, None);
        }
        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                let host = host
                    .strip_prefix('[')
                    .and_then(|h| h.strip_suffix(']'))
                    .unwrap_or(host);
                Self::new(host, Some(port.to_string()))
            }
            _ => Self::new(address, None),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) if self.host.contains(':') => write!(f, "[{}]:{}", self.host, port),
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// One routed destination of a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Destination {
    /// URL path prefixes. Empty matches any path.
    pub paths: Vec<String>,

    /// Backend port.
    pub port: Option<String>,

    /// Listening port on the proxy for tcp services.
    pub src_port: Option<u16>,

    /// Explicit `host:port` backends declared by the caller.
    pub addresses: Vec<String>,

    /// Endpoints filled in by the resolver for the current reconfiguration.
    #[serde(skip)]
    pub resolved: Vec<Endpoint>,
}

impl Destination {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: Some(port.into()),
            ..Self::default()
        }
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_src_port(mut self, src_port: u16) -> Self {
        self.src_port = Some(src_port);
        self
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// True when the destination has no path restriction.
    pub fn matches_any_path(&self) -> bool {
        self.paths.is_empty()
    }
}

// `resolved` is transient and not part of identity.
impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.paths == other.paths
            && self.port == other.port
            && self.src_port == other.src_port
            && self.addresses == other.addresses
    }
}

impl Eq for Destination {}

/// One logical routable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Hostnames to match. Empty matches any host.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub request_mode: RequestMode,
    #[serde(default)]
    pub outbound_hostname: Option<String>,
    #[serde(default)]
    pub https_only: bool,
    pub destinations: Vec<Destination>,
}

impl Service {
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    /// Identifier for this service and color, used to name acls and pools.
    pub fn route_id(&self) -> String {
        match self.color.as_deref().filter(|c| !c.is_empty()) {
            Some(color) => format!("{}-{}", self.name, color),
            None => self.name.clone(),
        }
    }

    /// Name of the backend pool for this service and color.
    pub fn pool_name(&self) -> String {
        format!("{}-be", self.route_id())
    }

    /// Hostname backends are reached on when nothing is resolved dynamically.
    pub fn backend_host(&self) -> &str {
        self.outbound_hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(&self.name)
    }

    /// True when the service routes regardless of the Host header.
    pub fn matches_any_host(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Fluent construction of a [`Service`].
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            service: Service {
                name: name.into(),
                color: None,
                domains: Vec::new(),
                request_mode: RequestMode::Http,
                outbound_hostname: None,
                https_only: false,
                destinations: Vec::new(),
            },
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.service.color = Some(color.into());
        self
    }

    pub fn domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn request_mode(mut self, mode: RequestMode) -> Self {
        self.service.request_mode = mode;
        self
    }

    pub fn outbound_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.service.outbound_hostname = Some(hostname.into());
        self
    }

    pub fn https_only(mut self, https_only: bool) -> Self {
        self.service.https_only = https_only;
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.service.destinations.push(destination);
        self
    }

    pub fn build(self) -> Service {
        self.service
    }
}
