//! Reload subsystem.
//!
//! # Data Flow
//! ```text
//! RenderedConfig
//!     → coordinator.rs: compose with header, skip if unchanged (incremental)
//!     → store.rs: write temp file, atomic rename over the live config
//!     → process.rs: graceful proxy reload (restore previous file on failure)
//!     → [engine releases its lock]
//!     → propagation.rs: per convergence
//!         - Registry:     POST reload-all to every registry address
//!         - Orchestrator: nothing
//!         - Listener:     ask the swarm listener to re-notify
//! ```
//!
//! # State Machine
//! ```text
//! Idle → Rendering → Writing → Reloading → Propagating → Idle
//!                       │          │
//!                       └──────────┴──→ abort (previous config stays live)
//! ```
//!
//! # Design Decisions
//! - The live file is never overwritten with a partial buffer
//! - Peer failures are collected per address, never short-circuited
//! - Every peer call is bounded by a deadline and a retry limit

pub mod coordinator;
pub mod process;
pub mod propagation;
pub mod store;

pub use coordinator::{Applied, ReloadCoordinator};
pub use process::{CommandProcess, NoopProcess, ProcessError, ProxyProcess};
pub use propagation::{HttpPeerNotifier, PeerError, PeerNotifier, PeerOutcome, ReloadAllRequest};
pub use store::{ConfigStore, FsConfigStore};
