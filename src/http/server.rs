//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every API route
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve until the shutdown future resolves

use axum::{
    body::Body,
    http::Request,
    routing::{get, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::certs::CertificateGateway;
use crate::config::ServerConfig;
use crate::engine::{ReconfigureContext, ReconfigureEngine};
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::lifecycle::Runtime;

/// Prefix every API route lives under.
pub const API_PREFIX: &str = "/v1/proxy";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReconfigureEngine>,
    pub certs: Arc<dyn CertificateGateway>,
    pub context: Arc<ReconfigureContext>,
}

impl From<&Runtime> for AppState {
    fn from(runtime: &Runtime) -> Self {
        Self {
            engine: runtime.engine.clone(),
            certs: runtime.certs.clone(),
            context: Arc::new(runtime.context.clone()),
        }
    }
}

/// The management API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/reconfigure", get(handlers::reconfigure))
            .route("/remove", get(handlers::remove))
            .route("/reload", get(handlers::reload))
            .route(
                "/reload-all",
                get(handlers::reload_all).post(handlers::reload_all),
            )
            .route("/config", get(handlers::config))
            .route("/cert", put(handlers::put_cert))
            .route("/certs", get(handlers::certs))
            .route("/services", get(handlers::services))
            .route("/ping", get(handlers::ping));

        Router::new()
            .nest(API_PREFIX, api)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "api_request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id(request),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.request_timeout_secs,
                    ))),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, prefix = API_PREFIX, "API server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlPlaneConfig;
    use crate::lifecycle::bootstrap;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    async fn router(max_body_size: usize) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ControlPlaneConfig::default();
        config.proxy.config_path = dir.path().join("haproxy.cfg").display().to_string();
        config.certs.dir = dir.path().join("certs").display().to_string();
        config.server.max_body_size = max_body_size;

        let runtime = bootstrap(&config).await.unwrap();
        let server = ApiServer::new(&config.server, AppState::from(&runtime));
        (server.router(), dir)
    }

    #[tokio::test]
    async fn test_ping_passes_through_layers() {
        let (app, _dir) = router(1024).await;
        let res = app
            .oneshot(
                Request::get(format!("{}/ping", API_PREFIX))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (app, _dir) = router(16).await;
        let res = app
            .oneshot(
                Request::put(format!("{}/cert?certName=big", API_PREFIX))
                    .header("content-length", "64")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
