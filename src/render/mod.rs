//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved services (full known set)
//!     → template.rs (sort by name, color)
//!         → front block: http acls + use_backend rules, tcp frontends
//!         → back block: one pool per service+color
//!     → compose(): base header + front + back = proxy config text
//! ```
//!
//! # Design Decisions
//! - Output is a pure function of the service set; arrival order is irrelevant
//! - Rules that match any host and path render after specific rules
//! - A pool with no endpoints still renders (the proxy answers 503)

pub mod template;

pub use template::{compose, RenderError, RenderedConfig, TemplateRenderer, TlsBindings, DEFAULT_HEADER};
