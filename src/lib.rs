//! Reverse proxy reconfiguration control plane.
//!
//! Services are registered through the HTTP API, resolved according to the
//! discovery mode, rendered into proxy config, written atomically, reloaded
//! and finally propagated to the rest of the proxy fleet.

// Core
pub mod config;
pub mod discovery;
pub mod engine;
pub mod render;
pub mod service;

// Side effects
pub mod certs;
pub mod http;
pub mod reload;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ControlPlaneConfig;
pub use engine::{ReconfigureContext, ReconfigureEngine, ReconfigureError, ReconfigureReport};
pub use http::ApiServer;
pub use lifecycle::Shutdown;
