//! Discovery mode selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::discovery::lookup::HostLookup;
use crate::discovery::resolver::{DefaultResolver, Resolver, ServiceResolver, SwarmResolver};

/// How backends are discovered and how peer proxies converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    #[default]
    Default,
    Service,
    Swarm,
}

impl DiscoveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMode::Default => "default",
            DiscoveryMode::Service => "service",
            DiscoveryMode::Swarm => "swarm",
        }
    }

    /// Build the resolver strategy for this mode.
    pub fn resolver(&self, lookup: Arc<dyn HostLookup>) -> Arc<dyn Resolver> {
        match self {
            DiscoveryMode::Default => Arc::new(DefaultResolver),
            DiscoveryMode::Service => Arc::new(ServiceResolver),
            DiscoveryMode::Swarm => Arc::new(SwarmResolver::new(lookup)),
        }
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown discovery mode '{0}' (expected default, service or swarm)")]
pub struct UnknownMode(pub String);

impl FromStr for DiscoveryMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(DiscoveryMode::Default),
            "service" => Ok(DiscoveryMode::Service),
            "swarm" => Ok(DiscoveryMode::Swarm),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Convergence, SystemLookup};

    #[test]
    fn test_mode_is_case_insensitive() {
        assert_eq!("seRviCe".parse::<DiscoveryMode>().unwrap(), DiscoveryMode::Service);
        assert_eq!("SWarM".parse::<DiscoveryMode>().unwrap(), DiscoveryMode::Swarm);
        assert_eq!("".parse::<DiscoveryMode>().unwrap(), DiscoveryMode::Default);
        assert!("mesh".parse::<DiscoveryMode>().is_err());
    }

    #[test]
    fn test_resolver_convergence_per_mode() {
        let lookup: Arc<dyn HostLookup> = Arc::new(SystemLookup);
        assert_eq!(
            DiscoveryMode::Default.resolver(lookup.clone()).convergence(),
            Convergence::Registry
        );
        assert_eq!(
            DiscoveryMode::Service.resolver(lookup.clone()).convergence(),
            Convergence::Orchestrator
        );
        assert_eq!(
            DiscoveryMode::Swarm.resolver(lookup).convergence(),
            Convergence::Listener
        );
    }
}
