//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine, reload, http
//!     → logging.rs (structured events, request spans from tower-http)
//!     → metrics.rs (reconfigure/reload/propagation counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request IDs are attached by the HTTP layer and flow through every span
//! - Metrics are recorded unconditionally; the exporter is opt-in

pub mod logging;
pub mod metrics;
