//! Service validation.
//!
//! # Responsibilities
//! - Reject malformed services before they reach discovery or rendering
//! - Detect routing ambiguity against the services already known
//!
//! # Design Decisions
//! - Pure function of the candidate and the known set
//! - Returns the first problem found, named by the API field it came from

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::service::model::{RequestMode, Service};

/// A service failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate `service` against the currently known services, keyed by name.
pub fn validate(
    service: &Service,
    known: &BTreeMap<String, Service>,
) -> Result<(), ValidationError> {
    let name = service.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("serviceName", "must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("serviceName", "must not contain whitespace"));
    }
    if service.destinations.is_empty() {
        return Err(ValidationError::new(
            "destinations",
            "at least one destination is required",
        ));
    }
    if service.domains.iter().any(|d| d.trim().is_empty()) {
        return Err(ValidationError::new("serviceDomain", "must not contain empty hostnames"));
    }

    for dest in &service.destinations {
        if let Some(path) = dest.paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ValidationError::new(
                "servicePath",
                format!("'{}' must start with '/'", path),
            ));
        }

        match dest.port.as_deref() {
            Some(port) => {
                if !matches!(port.parse::<u16>(), Ok(p) if p > 0) {
                    return Err(ValidationError::new(
                        "port",
                        format!("'{}' is not a valid port", port),
                    ));
                }
            }
            None if dest.addresses.is_empty() => {
                return Err(ValidationError::new(
                    "port",
                    "required unless explicit addresses are given",
                ));
            }
            None => {}
        }

        if service.request_mode == RequestMode::Tcp && dest.src_port.is_none() {
            return Err(ValidationError::new("srcPort", "required for tcp services"));
        }
    }

    check_own_tcp_ports(service)?;

    let route_id = service.route_id();
    for other in known.values().filter(|o| o.name != service.name) {
        if other.route_id() == route_id {
            return Err(ValidationError::new(
                "serviceColor",
                format!("'{}' collides with the routes of '{}'", route_id, other.name),
            ));
        }
        check_tcp_ports(service, other)?;
        check_match_any(service, other)?;
    }

    if let Some(previous) = known.get(&service.name) {
        if previous.request_mode != service.request_mode {
            return Err(ValidationError::new(
                "reqMode",
                format!(
                    "'{}' is already registered in {} mode",
                    service.name, previous.request_mode
                ),
            ));
        }
    }

    Ok(())
}

fn check_own_tcp_ports(service: &Service) -> Result<(), ValidationError> {
    if service.request_mode != RequestMode::Tcp {
        return Ok(());
    }
    let mut seen = BTreeSet::new();
    for port in service.destinations.iter().filter_map(|d| d.src_port) {
        if !seen.insert(port) {
            return Err(ValidationError::new(
                "srcPort",
                format!("'{}' is used by more than one destination", port),
            ));
        }
    }
    Ok(())
}

fn check_tcp_ports(service: &Service, other: &Service) -> Result<(), ValidationError> {
    if service.request_mode != RequestMode::Tcp || other.request_mode != RequestMode::Tcp {
        return Ok(());
    }
    for dest in &service.destinations {
        let clash = other
            .destinations
            .iter()
            .any(|o| o.src_port.is_some() && o.src_port == dest.src_port);
        if clash {
            return Err(ValidationError::new(
                "srcPort",
                format!("already claimed by '{}'", other.name),
            ));
        }
    }
    Ok(())
}

fn check_match_any(service: &Service, other: &Service) -> Result<(), ValidationError> {
    if service.request_mode != RequestMode::Http
        || other.request_mode != RequestMode::Http
        || !service.matches_any_host()
        || !other.matches_any_host()
    {
        return Ok(());
    }
    for dest in service.destinations.iter().filter(|d| d.matches_any_path()) {
        let shadowed = other
            .destinations
            .iter()
            .any(|o| o.matches_any_path() && o.port == dest.port);
        if shadowed {
            return Err(ValidationError::new(
                "servicePath",
                format!(
                    "'{}' already matches any host and path on port {}",
                    other.name,
                    dest.port.as_deref().unwrap_or("-")
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::model::Destination;

    fn known(services: &[Service]) -> BTreeMap<String, Service> {
        services.iter().map(|s| (s.name.clone(), s.clone())).collect()
    }

    fn api() -> Service {
        Service::builder("api")
            .destination(Destination::new("80").with_paths(["/api"]))
            .build()
    }

    #[test]
    fn test_valid_service() {
        assert!(validate(&api(), &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_rejects_empty_name() {
        let s = Service::builder("  ").destination(Destination::new("80")).build();
        let err = validate(&s, &BTreeMap::new()).unwrap_err();
        assert_eq!(err.field, "serviceName");
    }

    #[test]
    fn test_rejects_missing_destinations() {
        let s = Service::builder("api").build();
        let err = validate(&s, &BTreeMap::new()).unwrap_err();
        assert_eq!(err.field, "destinations");
    }

    #[test]
    fn test_rejects_relative_path() {
        let s = Service::builder("api")
            .destination(Destination::new("80").with_paths(["api"]))
            .build();
        let err = validate(&s, &BTreeMap::new()).unwrap_err();
        assert_eq!(err.field, "servicePath");
    }

    #[test]
    fn test_port_rules() {
        let bad = Service::builder("api").destination(Destination::new("http")).build();
        assert_eq!(validate(&bad, &BTreeMap::new()).unwrap_err().field, "port");

        let missing = Service::builder("api")
            .destination(Destination::default().with_paths(["/api"]))
            .build();
        assert_eq!(validate(&missing, &BTreeMap::new()).unwrap_err().field, "port");

        let explicit = Service::builder("api")
            .destination(Destination::default().with_addresses(["10.0.0.1:8080"]))
            .build();
        assert!(validate(&explicit, &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_rejects_ambiguous_match_any() {
        let existing = Service::builder("web").destination(Destination::new("80")).build();
        let candidate = Service::builder("other").destination(Destination::new("80")).build();
        let err = validate(&candidate, &known(&[existing.clone()])).unwrap_err();
        assert_eq!(err.field, "servicePath");

        // Same name replaces rather than shadows.
        let replacement = Service::builder("web").destination(Destination::new("80")).build();
        assert!(validate(&replacement, &known(&[existing.clone()])).is_ok());

        // A different port is not ambiguous.
        let elsewhere = Service::builder("other").destination(Destination::new("81")).build();
        assert!(validate(&elsewhere, &known(&[existing])).is_ok());
    }

    #[test]
    fn test_tcp_requires_src_port() {
        let s = Service::builder("db")
            .request_mode(RequestMode::Tcp)
            .destination(Destination::new("5432"))
            .build();
        assert_eq!(validate(&s, &BTreeMap::new()).unwrap_err().field, "srcPort");
    }

    #[test]
    fn test_rejects_mode_collision() {
        let http = api();
        let tcp = Service::builder("api")
            .request_mode(RequestMode::Tcp)
            .destination(Destination::new("5432").with_src_port(5432))
            .build();
        let err = validate(&tcp, &known(&[http])).unwrap_err();
        assert_eq!(err.field, "reqMode");
    }

    #[test]
    fn test_rejects_shared_tcp_src_port() {
        let a = Service::builder("db-a")
            .request_mode(RequestMode::Tcp)
            .destination(Destination::new("5432").with_src_port(6000))
            .build();
        let b = Service::builder("db-b")
            .request_mode(RequestMode::Tcp)
            .destination(Destination::new("5432").with_src_port(6000))
            .build();
        assert_eq!(validate(&b, &known(&[a])).unwrap_err().field, "srcPort");
    }

    #[test]
    fn test_rejects_repeated_src_port_within_service() {
        let s = Service::builder("db")
            .request_mode(RequestMode::Tcp)
            .destination(Destination::new("5432").with_src_port(6000))
            .destination(Destination::new("5433").with_src_port(6000))
            .build();
        let err = validate(&s, &BTreeMap::new()).unwrap_err();
        assert_eq!(err.field, "srcPort");
        assert!(err.reason.contains("6000"));
    }

    #[test]
    fn test_rejects_colliding_route_id() {
        let colored = Service::builder("a")
            .color("b")
            .destination(Destination::new("80").with_paths(["/x"]))
            .build();
        let plain = Service::builder("a-b")
            .destination(Destination::new("80").with_paths(["/y"]))
            .build();
        let err = validate(&plain, &known(&[colored.clone()])).unwrap_err();
        assert_eq!(err.field, "serviceColor");

        // Recoloring the same service is a replacement.
        let recolored = Service::builder("a")
            .color("c")
            .destination(Destination::new("80").with_paths(["/x"]))
            .build();
        assert!(validate(&recolored, &known(&[colored])).is_ok());
    }
}
