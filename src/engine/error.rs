//! Reconfiguration error taxonomy.

use thiserror::Error;

use crate::certs::CertError;
use crate::discovery::ResolutionError;
use crate::reload::{PeerOutcome, ProcessError};
use crate::render::RenderError;
use crate::service::ValidationError;

/// Why a reconfiguration did not complete.
#[derive(Debug, Error)]
pub enum ReconfigureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write proxy config: {0}")]
    Write(#[source] std::io::Error),

    #[error("proxy reload failed: {0}")]
    Reload(#[source] ProcessError),

    #[error("propagation failed on every peer: {}", summarize(.outcomes))]
    Propagation { outcomes: Vec<PeerOutcome> },

    #[error(transparent)]
    Certificate(#[from] CertError),
}

fn summarize(outcomes: &[PeerOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| format!("{} ({})", o.address, o.error.as_deref().unwrap_or("ok")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReconfigureError {
    /// True when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            ReconfigureError::Validation(_) => true,
            ReconfigureError::Certificate(e) => e.is_client_error(),
            _ => false,
        }
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReconfigureError::Validation(_) => "validation",
            ReconfigureError::Resolution(_) => "resolution",
            ReconfigureError::Render(_) => "render",
            ReconfigureError::Write(_) => "write",
            ReconfigureError::Reload(_) => "reload",
            ReconfigureError::Propagation { .. } => "propagation",
            ReconfigureError::Certificate(_) => "certificate",
        }
    }
}
