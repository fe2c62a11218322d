//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware stack)
//!     → request.rs (request ID assigned and echoed)
//!     → params.rs (query pairs → Service)
//!     → handlers.rs (one engine or certificate call)
//!     → response.rs ({status, message} JSON, 400 for bad input, 500 otherwise)
//! ```

pub mod handlers;
pub mod params;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{ApiError, ApiResponse};
pub use server::{ApiServer, AppState, API_PREFIX};
