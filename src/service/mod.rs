//! Service model subsystem.
//!
//! # Data Flow
//! ```text
//! API query parameters
//!     → model.rs (Service / Destination values, built per request)
//!     → validation.rs (pure checks against the known-service set)
//!     → handed to the reconfiguration engine
//! ```
//!
//! # Design Decisions
//! - Values are plain data; behavior is limited to naming helpers
//! - `Service.name` is the merge key of the known-service set
//! - Resolved endpoints ride along on `Destination` but never take part
//!   in equality or serialization

pub mod model;
pub mod validation;

pub use model::{Destination, Endpoint, RequestMode, Service, ServiceBuilder};
pub use validation::{validate, ValidationError};
