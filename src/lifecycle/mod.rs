//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Context → Certificates init → Engine → Initial resync
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Local full resync (no peer propagation)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then engine, then listeners
//! - The API only accepts traffic after the initial config is live

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, build_engine, Runtime, StartupError};
