//! Query-string to service translation.
//!
//! A reconfigure request describes one destination with the plain keys
//! (`servicePath`, `port`, `srcPort`, `address`) and further destinations
//! with indexed keys (`servicePath.1`, `port.1`, ...). Plain keys come first,
//! indexed ones follow in ascending index order.

use std::collections::BTreeSet;

use crate::service::{Destination, RequestMode, Service, ValidationError};

const DESTINATION_KEYS: [&str; 4] = ["servicePath", "port", "srcPort", "address"];

/// Raw query pairs in arrival order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl QueryParams {
    /// First non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Boolean flag; absent or empty means false.
    pub fn flag(&self, key: &str) -> Result<bool, ValidationError> {
        match self.get(key) {
            None => Ok(false),
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
            Some(v) => Err(ValidationError::new(key, format!("'{}' is not a boolean", v))),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Key for `base` at `index`; index 0 is the plain key.
fn indexed(base: &str, index: u32) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{}.{}", base, index)
    }
}

fn destination_indexes(params: &QueryParams) -> Vec<u32> {
    let mut indexes = BTreeSet::new();
    for (key, value) in &params.pairs {
        if value.trim().is_empty() {
            continue;
        }
        let (base, index) = match key.split_once('.') {
            Some((base, suffix)) => match suffix.parse::<u32>() {
                Ok(n) if n > 0 => (base, n),
                _ => continue,
            },
            None => (key.as_str(), 0),
        };
        if DESTINATION_KEYS.contains(&base) {
            indexes.insert(index);
        }
    }
    indexes.into_iter().collect()
}

fn destination(params: &QueryParams, index: u32) -> Result<Destination, ValidationError> {
    let src_key = indexed("srcPort", index);
    let src_port = match params.get(&src_key) {
        Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
            ValidationError::new(src_key.as_str(), format!("'{}' is not a valid port", raw))
        })?),
        None => None,
    };
    Ok(Destination {
        paths: split_list(params.get(&indexed("servicePath", index))),
        port: params.get(&indexed("port", index)).map(String::from),
        src_port,
        addresses: split_list(params.get(&indexed("address", index))),
        resolved: Vec::new(),
    })
}

/// Build a service from reconfigure query parameters.
pub fn service_from_query(params: &QueryParams) -> Result<Service, ValidationError> {
    let name = params
        .get("serviceName")
        .ok_or_else(|| ValidationError::new("serviceName", "is required"))?;

    let request_mode: RequestMode = params.get("reqMode").unwrap_or_default().parse()?;

    let mut builder = Service::builder(name)
        .domains(split_list(params.get("serviceDomain")))
        .request_mode(request_mode)
        .https_only(params.flag("httpsOnly")?);
    if let Some(color) = params.get("serviceColor") {
        builder = builder.color(color);
    }
    if let Some(hostname) = params.get("outboundHostname") {
        builder = builder.outbound_hostname(hostname);
    }
    for index in destination_indexes(params) {
        builder = builder.destination(destination(params, index)?);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_single_destination() {
        let service = service_from_query(&params(&[
            ("serviceName", "go-demo"),
            ("servicePath", "/demo,/api"),
            ("port", "8080"),
            ("serviceDomain", "example.com"),
        ]))
        .unwrap();

        assert_eq!(service.name, "go-demo");
        assert_eq!(service.domains, ["example.com"]);
        assert_eq!(service.destinations.len(), 1);
        assert_eq!(service.destinations[0].paths, ["/demo", "/api"]);
        assert_eq!(service.destinations[0].port.as_deref(), Some("8080"));
    }

    #[test]
    fn test_indexed_destinations_follow_plain_ones() {
        let service = service_from_query(&params(&[
            ("serviceName", "multi"),
            ("servicePath.2", "/two"),
            ("port.2", "9002"),
            ("servicePath", "/zero"),
            ("port", "9000"),
            ("servicePath.1", "/one"),
            ("port.1", "9001"),
        ]))
        .unwrap();

        let ports: Vec<&str> = service
            .destinations
            .iter()
            .map(|d| d.port.as_deref().unwrap())
            .collect();
        assert_eq!(ports, ["9000", "9001", "9002"]);
    }

    #[test]
    fn test_tcp_service() {
        let service = service_from_query(&params(&[
            ("serviceName", "db"),
            ("reqMode", "TCP"),
            ("port", "5432"),
            ("srcPort", "15432"),
        ]))
        .unwrap();
        assert_eq!(service.request_mode, RequestMode::Tcp);
        assert_eq!(service.destinations[0].src_port, Some(15432));
    }

    #[test]
    fn test_bad_input_names_the_field() {
        let err = service_from_query(&params(&[("port", "80")])).unwrap_err();
        assert_eq!(err.field, "serviceName");

        let err = service_from_query(&params(&[
            ("serviceName", "x"),
            ("port.1", "80"),
            ("srcPort.1", "big"),
        ]))
        .unwrap_err();
        assert_eq!(err.field, "srcPort.1");

        let err = service_from_query(&params(&[("serviceName", "x"), ("httpsOnly", "maybe")]))
            .unwrap_err();
        assert_eq!(err.field, "httpsOnly");

        let err = service_from_query(&params(&[("serviceName", "x"), ("reqMode", "udp")]))
            .unwrap_err();
        assert_eq!(err.field, "reqMode");
    }
}
