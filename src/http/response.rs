//! API response bodies and error mapping.
//!
//! # Responsibilities
//! - Render every outcome as `{ "status": "OK" | "NOK", "message": ... }`
//! - Map client errors to 400 and everything else to 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::certs::CertError;
use crate::engine::{ReconfigureError, ReconfigureReport};
use crate::reload::PeerOutcome;
use crate::service::ValidationError;

/// JSON body of every API answer.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reloaded: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<PeerOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "OK",
            message: message.into(),
            services: None,
            reloaded: None,
            peers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn nok(message: impl Into<String>) -> Self {
        Self {
            status: "NOK",
            ..Self::ok(message)
        }
    }

    pub fn from_report(message: impl Into<String>, report: ReconfigureReport) -> Self {
        Self {
            services: Some(report.services),
            reloaded: Some(report.reloaded),
            warnings: report.warnings(),
            peers: report.peers,
            ..Self::ok(message)
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let code = if self.status == "OK" {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (code, Json(self)).into_response()
    }
}

/// A failed API call.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ReconfigureError> for ApiError {
    fn from(err: ReconfigureError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ReconfigureError::from(err).into()
    }
}

impl From<CertError> for ApiError {
    fn from(err: CertError) -> Self {
        ReconfigureError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "Request rejected");
        }
        (self.status, Json(ApiResponse::nok(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: ApiError = ValidationError::new("serviceName", "is required").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "invalid serviceName: is required");
    }

    #[test]
    fn test_server_errors_map_to_500() {
        let err: ApiError = ReconfigureError::Write(std::io::Error::other("disk full")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_report_body_carries_warnings() {
        let report = ReconfigureReport {
            services: 2,
            reloaded: true,
            peers: vec![PeerOutcome::ok("http://a"), PeerOutcome::failed("http://b", "timeout")],
        };
        let body = serde_json::to_value(ApiResponse::from_report("done", report)).unwrap();
        assert_eq!(body["status"], "OK");
        assert_eq!(body["services"], 2);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }
}
