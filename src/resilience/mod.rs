//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a peer endpoint:
//!     → timeouts.rs (every attempt has a deadline)
//!     → On failure: retries.rs (retry with backoff until attempts run out)
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Every peer call has a deadline
//! - Backoff delays carry up to 10% jitter
//! - Retries are bounded and the last error is reported

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::{calculate_backoff, RetryPolicy};
pub use retries::retry_with_backoff;
pub use timeouts::{with_deadline, DeadlineExceeded};
