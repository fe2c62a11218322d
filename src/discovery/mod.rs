//! Discovery subsystem.
//!
//! # Data Flow
//! ```text
//! DiscoveryMode (from ReconfigureContext)
//!     → mode.rs (pick one Resolver strategy)
//!     → resolver.rs (fill Destination::resolved for every destination)
//!         - default: declared addresses or hostname:port, no lookup
//!         - service: orchestrator service name, no lookup
//!         - swarm:   lookup.rs DNS query, one endpoint per task IP
//!     → Service copies handed to the renderer
//! ```
//!
//! # Design Decisions
//! - Resolution is redone on every reconfiguration; nothing is cached
//! - DNS answer order is kept as-is
//! - An empty answer is a valid, empty pool; only lookup failures are errors
//! - Each strategy also reports how peer proxies converge, so the engine
//!   never compares mode strings

pub mod lookup;
pub mod mode;
pub mod resolver;

pub use lookup::{HostLookup, SystemLookup};
pub use mode::DiscoveryMode;
pub use resolver::{
    Convergence, DefaultResolver, ResolutionError, Resolver, ServiceResolver, SwarmResolver,
};
