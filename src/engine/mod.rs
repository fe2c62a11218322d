//! Reconfiguration engine subsystem.
//!
//! # Data Flow
//! ```text
//! execute(service, ctx) / remove(name, ctx) / reload(recreate, ctx)
//!     → [engine lock]
//!         → service::validate (against the known set)
//!         → discovery resolver for ctx.mode (every known service)
//!         → certs bundle → TlsBindings
//!         → render::TemplateRenderer
//!         → reload::ReloadCoordinator::apply (write, reload)
//!         → commit known set, publish snapshot
//!     → [lock released]
//!     → reload::ReloadCoordinator::propagate (per convergence)
//!     → ReconfigureReport | ReconfigureError
//! ```
//!
//! # Design Decisions
//! - One lock for every mutation; the renderer always sees one coherent set
//! - The known set only changes after a successful reload
//! - Readers use an arc-swap snapshot and never wait on the lock
//! - Partial peer failure is a warning; failure on every peer is an error

pub mod context;
pub mod error;
pub mod reconfigure;

pub use context::{listener_url, normalize_addresses, ReconfigureContext, LISTENER_PORT};
pub use error::ReconfigureError;
pub use reconfigure::{ReconfigureEngine, ReconfigureReport};
