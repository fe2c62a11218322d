//! Certificate subsystem.
//!
//! # Data Flow
//! ```text
//! PUT /cert (PEM body)
//!     → store.rs (name check, PEM parse, atomic write, index)
//!     → engine full resync (TLS bindings refreshed)
//!
//! Every render:
//!     → get_all() → TlsBindings (https listener only when certs exist)
//! ```
//!
//! # Design Decisions
//! - The engine only reads the bundle; storage and rotation live here
//! - Content must contain at least one PEM certificate or key
//! - Files are written to a temp file and renamed into place

pub mod store;

pub use store::{CertError, Certificate, CertificateBundle, CertificateGateway, FsCertStore};
