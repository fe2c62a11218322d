//! Front-end and back-end block rendering.

use thiserror::Error;

use crate::config::ProxyConfig;
use crate::service::{RequestMode, Service};

/// Global and defaults sections used when no header template is configured.
pub const DEFAULT_HEADER: &str = "\
global
    pidfile /var/run/haproxy.pid
    tune.ssl.default-dh-param 2048

defaults
    mode http
    balance roundrobin
    option http-server-close
    option forwardfor
    timeout connect 5s
    timeout client 20s
    timeout server 20s
    timeout queue 30s
    timeout http-request 5s
";

/// Internal invariant broken before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("service '{service}' reached the renderer without destinations")]
    NoDestinations { service: String },
}

/// The two artifacts the proxy consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedConfig {
    pub front: String,
    pub back: String,
}

/// TLS listener settings derived from the certificate bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsBindings {
    /// Directory holding the certificates, when there is at least one.
    pub certs_dir: Option<String>,
}

impl TlsBindings {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_certs(certs_dir: impl Into<String>, cert_count: usize) -> Self {
        Self {
            certs_dir: (cert_count > 0).then(|| certs_dir.into()),
        }
    }
}

/// Renders the known-service set into proxy config blocks.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    http_port: u16,
    https_port: u16,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self {
            http_port: 80,
            https_port: 443,
        }
    }
}

impl TemplateRenderer {
    pub fn new(http_port: u16, https_port: u16) -> Self {
        Self {
            http_port,
            https_port,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.http_port, config.https_port)
    }

    /// Render every service. The result depends only on the set's content.
    pub fn render(&self, services: &[Service], tls: &TlsBindings) -> Result<RenderedConfig, RenderError> {
        if let Some(empty) = services.iter().find(|s| s.destinations.is_empty()) {
            return Err(RenderError::NoDestinations {
                service: empty.name.clone(),
            });
        }

        let mut ordered: Vec<&Service> = services.iter().collect();
        ordered.sort_by(|a, b| (&a.name, &a.color).cmp(&(&b.name, &b.color)));

        Ok(RenderedConfig {
            front: self.render_front(&ordered, tls),
            back: render_back(&ordered),
        })
    }

    fn render_front(&self, services: &[&Service], tls: &TlsBindings) -> String {
        let mut lines = vec![
            "frontend services".to_string(),
            format!("    bind *:{}", self.http_port),
        ];
        if let Some(dir) = &tls.certs_dir {
            lines.push(format!("    bind *:{} ssl crt {}", self.https_port, dir));
        }
        lines.push("    mode http".to_string());

        let mut specific = Vec::new();
        let mut catch_all = Vec::new();
        for service in services.iter().filter(|s| s.request_mode == RequestMode::Http) {
            let id = service.route_id();
            let pool = service.pool_name();
            for (i, dest) in service.destinations.iter().enumerate() {
                let mut acls = Vec::new();
                let mut conditions = Vec::new();
                if !dest.paths.is_empty() {
                    acls.push(format!("    acl url_{}_{} path_beg {}", id, i, dest.paths.join(" ")));
                    conditions.push(format!("url_{}_{}", id, i));
                }
                if !service.domains.is_empty() {
                    acls.push(format!(
                        "    acl domain_{}_{} hdr_dom(host) -i {}",
                        id,
                        i,
                        service.domains.join(" ")
                    ));
                    conditions.push(format!("domain_{}_{}", id, i));
                }

                let target = if conditions.is_empty() {
                    &mut catch_all
                } else {
                    &mut specific
                };
                target.extend(acls);
                let condition = if conditions.is_empty() {
                    "TRUE".to_string()
                } else {
                    conditions.join(" ")
                };
                if service.https_only {
                    target.push(format!(
                        "    http-request redirect scheme https if !{{ ssl_fc }} {}",
                        condition
                    ));
                }
                target.push(format!("    use_backend {} if {}", pool, condition));
            }
        }
        if !specific.is_empty() || !catch_all.is_empty() {
            lines.push(String::new());
        }
        lines.extend(specific);
        lines.extend(catch_all);

        for service in services.iter().filter(|s| s.request_mode == RequestMode::Tcp) {
            let pool = service.pool_name();
            for dest in &service.destinations {
                if let Some(src_port) = dest.src_port {
                    lines.push(String::new());
                    lines.push(format!("frontend tcp_{}", src_port));
                    lines.push(format!("    bind *:{}", src_port));
                    lines.push("    mode tcp".to_string());
                    lines.push(format!("    default_backend {}", pool));
                }
            }
        }

        join_lines(lines)
    }
}

fn render_back(services: &[&Service]) -> String {
    let mut lines = Vec::new();
    for service in services {
        let pool = service.pool_name();
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("backend {}", pool));
        lines.push(format!("    mode {}", service.request_mode));

        let mut endpoints: Vec<String> = Vec::new();
        for endpoint in service.destinations.iter().flat_map(|d| d.resolved.iter()) {
            let rendered = endpoint.to_string();
            if !endpoints.contains(&rendered) {
                endpoints.push(rendered);
            }
        }
        for (n, endpoint) in endpoints.iter().enumerate() {
            lines.push(format!("    server {}_{} {} check", pool, n, endpoint));
        }
    }
    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Assemble the full proxy config from a header and the rendered blocks.
pub fn compose(header: &str, rendered: &RenderedConfig) -> String {
    let mut out = String::with_capacity(header.len() + rendered.front.len() + rendered.back.len() + 2);
    out.push_str(header.trim_end());
    out.push_str("\n\n");
    out.push_str(&rendered.front);
    if !rendered.back.is_empty() {
        out.push('\n');
        out.push_str(&rendered.back);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Destination, Endpoint};

    fn resolved(mut service: Service, endpoints: &[&str]) -> Service {
        for dest in &mut service.destinations {
            dest.resolved = endpoints.iter().map(|e| Endpoint::parse(e)).collect();
        }
        service
    }

    fn api() -> Service {
        resolved(
            Service::builder("myService")
                .destination(Destination::new("80").with_paths(["/api"]))
                .build(),
            &["myService:80"],
        )
    }

    #[test]
    fn test_path_rule_routes_to_pool() {
        let out = TemplateRenderer::default().render(&[api()], &TlsBindings::none()).unwrap();
        assert!(out.front.contains("acl url_myService_0 path_beg /api"));
        assert!(out.front.contains("use_backend myService-be if url_myService_0"));
        assert!(out.back.contains("backend myService-be"));
        assert!(out.back.contains("server myService-be_0 myService:80 check"));
    }

    #[test]
    fn test_render_ignores_arrival_order() {
        let web = resolved(
            Service::builder("web")
                .color("blue")
                .domains(["example.com"])
                .destination(Destination::new("8080"))
                .build(),
            &["10.0.0.1:8080", "10.0.0.2:8080"],
        );
        let renderer = TemplateRenderer::default();
        let a = renderer.render(&[api(), web.clone()], &TlsBindings::none()).unwrap();
        let b = renderer.render(&[web, api()], &TlsBindings::none()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_pool_still_renders() {
        let s = resolved(
            Service::builder("idle")
                .destination(Destination::new("80").with_paths(["/idle"]))
                .build(),
            &[],
        );
        let out = TemplateRenderer::default().render(&[s], &TlsBindings::none()).unwrap();
        assert!(out.back.contains("backend idle-be"));
        assert!(!out.back.contains("server "));
    }

    #[test]
    fn test_catch_all_renders_last() {
        let catch_all = resolved(
            Service::builder("aaa-default").destination(Destination::new("80")).build(),
            &["aaa-default:80"],
        );
        let out = TemplateRenderer::default()
            .render(&[catch_all, api()], &TlsBindings::none())
            .unwrap();
        let specific = out.front.find("use_backend myService-be").unwrap();
        let any = out.front.find("use_backend aaa-default-be if TRUE").unwrap();
        assert!(specific < any);
    }

    #[test]
    fn test_tcp_service_gets_own_frontend() {
        let db = resolved(
            Service::builder("db")
                .request_mode(RequestMode::Tcp)
                .destination(Destination::new("5432").with_src_port(6432))
                .build(),
            &["db:5432"],
        );
        let out = TemplateRenderer::default().render(&[db], &TlsBindings::none()).unwrap();
        assert!(out.front.contains("frontend tcp_6432"));
        assert!(out.front.contains("default_backend db-be"));
        assert!(!out.front.contains("use_backend db-be"));
        assert!(out.back.contains("    mode tcp"));
    }

    #[test]
    fn test_tls_binding_and_https_redirect() {
        let secure = resolved(
            Service::builder("shop")
                .https_only(true)
                .domains(["shop.example.com"])
                .destination(Destination::new("80"))
                .build(),
            &["shop:80"],
        );
        let tls = TlsBindings::from_certs("/certs", 1);
        let out = TemplateRenderer::new(8080, 8443).render(&[secure], &tls).unwrap();
        assert!(out.front.contains("bind *:8080"));
        assert!(out.front.contains("bind *:8443 ssl crt /certs"));
        assert!(out
            .front
            .contains("http-request redirect scheme https if !{ ssl_fc } domain_shop_0"));

        let none = TlsBindings::from_certs("/certs", 0);
        assert_eq!(none, TlsBindings::none());
    }

    #[test]
    fn test_missing_destinations_is_render_error() {
        let broken = Service::builder("broken").build();
        let err = TemplateRenderer::default()
            .render(&[broken], &TlsBindings::none())
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::NoDestinations {
                service: "broken".into()
            }
        );
    }

    #[test]
    fn test_compose_joins_blocks() {
        let out = TemplateRenderer::default().render(&[api()], &TlsBindings::none()).unwrap();
        let full = compose(DEFAULT_HEADER, &out);
        assert!(full.starts_with("global\n"));
        let front = full.find("frontend services").unwrap();
        let back = full.find("backend myService-be").unwrap();
        assert!(front < back);
    }
}
