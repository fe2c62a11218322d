//! Peer notification.
//!
//! # Responsibilities
//! - Ask registry peers to reload every service (default mode)
//! - Ask the swarm listener to re-send its notifications (swarm mode)
//! - Report one outcome per peer

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::discovery::DiscoveryMode;
use crate::resilience::DeadlineExceeded;

/// A single peer call failed.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("invalid peer url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("peer answered with status {0}")]
    Status(u16),

    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),
}

/// Identity sent along with a reload-all call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadAllRequest {
    pub instance_name: String,
    pub mode: DiscoveryMode,
    pub listener_address: Option<String>,
}

/// Result of notifying one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerOutcome {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PeerOutcome {
    pub fn ok(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            error: None,
        }
    }

    pub fn failed(address: impl Into<String>, error: impl ToString) -> Self {
        Self {
            address: address.into(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outbound calls to other members of the proxy fleet.
#[async_trait]
pub trait PeerNotifier: Send + Sync {
    /// Ask the registry-side peer at `base` to reload all services.
    async fn reload_all(&self, base: &str, request: &ReloadAllRequest) -> Result<(), PeerError>;

    /// Ask the swarm listener at `listener` to re-notify every proxy.
    async fn notify_listener(&self, listener: &str) -> Result<(), PeerError>;
}

/// [`PeerNotifier`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPeerNotifier {
    client: reqwest::Client,
    reload_all_path: String,
    listener_notify_path: String,
}

impl HttpPeerNotifier {
    pub fn new(
        timeout: Duration,
        reload_all_path: impl Into<String>,
        listener_notify_path: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            reload_all_path: reload_all_path.into(),
            listener_notify_path: listener_notify_path.into(),
        })
    }

    fn join(base: &str, path: &str) -> Result<Url, PeerError> {
        let raw = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|source| PeerError::InvalidUrl { url: raw, source })
    }

    /// Full reload-all URL for the peer at `base`.
    pub fn reload_all_url(&self, base: &str, request: &ReloadAllRequest) -> Result<Url, PeerError> {
        let mut url = Self::join(base, &self.reload_all_path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("instance", &request.instance_name);
            query.append_pair("mode", request.mode.as_str());
            query.append_pair(
                "listenerAddress",
                request.listener_address.as_deref().unwrap_or(""),
            );
        }
        Ok(url)
    }
}

fn check_status(response: reqwest::Response) -> Result<(), PeerError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(PeerError::Status(status.as_u16()))
    }
}

#[async_trait]
impl PeerNotifier for HttpPeerNotifier {
    async fn reload_all(&self, base: &str, request: &ReloadAllRequest) -> Result<(), PeerError> {
        let url = self.reload_all_url(base, request)?;
        tracing::debug!(url = %url, "Sending reload-all to peer");
        let response = self.client.post(url).send().await?;
        check_status(response)
    }

    async fn notify_listener(&self, listener: &str) -> Result<(), PeerError> {
        let url = Self::join(listener, &self.listener_notify_path)?;
        tracing::debug!(url = %url, "Notifying swarm listener");
        let response = self.client.get(url).send().await?;
        check_status(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> HttpPeerNotifier {
        HttpPeerNotifier::new(
            Duration::from_secs(1),
            "/v1/proxy/reload-all",
            "/v1/swarm-listener/notify-services",
        )
        .unwrap()
    }

    #[test]
    fn test_reload_all_url_carries_identity() {
        let request = ReloadAllRequest {
            instance_name: "edge".to_string(),
            mode: DiscoveryMode::Default,
            listener_address: Some("http://swarm-listener:8080".to_string()),
        };
        let url = notifier()
            .reload_all_url("http://consul:8500/", &request)
            .unwrap();

        assert_eq!(url.path(), "/v1/proxy/reload-all");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("instance".to_string(), "edge".to_string()),
                ("mode".to_string(), "default".to_string()),
                (
                    "listenerAddress".to_string(),
                    "http://swarm-listener:8080".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_invalid_base_is_reported() {
        let request = ReloadAllRequest {
            instance_name: "edge".to_string(),
            mode: DiscoveryMode::Default,
            listener_address: None,
        };
        let err = notifier().reload_all_url("not a url", &request).unwrap_err();
        assert!(matches!(err, PeerError::InvalidUrl { .. }));
    }

    #[test]
    fn test_outcome_serialization_omits_success_error() {
        let json = serde_json::to_value(PeerOutcome::ok("http://a")).unwrap();
        assert_eq!(json, serde_json::json!({ "address": "http://a" }));
        assert!(!PeerOutcome::failed("http://b", "status 500").is_ok());
    }
}
