//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use routeplane::config::ControlPlaneConfig;
use routeplane::http::{ApiServer, AppState, API_PREFIX};
use routeplane::lifecycle::{bootstrap, Shutdown};

/// A raw-TCP HTTP peer that records request lines and answers with a fixed status.
#[allow(dead_code)]
pub struct MockPeer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockPeer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `"METHOD target"` for every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a mock peer answering every request with `status`.
#[allow(dead_code)]
pub async fn start_mock_peer(status: u16) -> MockPeer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        if let Some(line) = head.lines().next() {
                            let mut parts = line.split_whitespace();
                            if let (Some(method), Some(target)) = (parts.next(), parts.next()) {
                                recorded.lock().unwrap().push(format!("{} {}", method, target));
                            }
                        }

                        let body = "{}";
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockPeer { addr, requests }
}

/// A running API server backed by temp directories.
#[allow(dead_code)]
pub struct TestApi {
    pub base: String,
    pub config_path: std::path::PathBuf,
    pub shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with every path inside `dir` and fast peer retries.
pub fn test_config(dir: &Path) -> ControlPlaneConfig {
    let mut config = ControlPlaneConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.proxy.config_path = dir.join("haproxy.cfg").display().to_string();
    config.certs.dir = dir.join("certs").display().to_string();
    config.propagation.timeout_secs = 2;
    config.propagation.max_attempts = 1;
    config
}

/// Bootstrap and serve the API; `customize` adjusts the config first.
pub async fn start_api<F>(customize: F) -> TestApi
where
    F: FnOnce(&mut ControlPlaneConfig),
{
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    customize(&mut config);

    let runtime = bootstrap(&config).await.unwrap();
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ApiServer::new(&config.server, AppState::from(&runtime));
    tokio::spawn(server.run(listener, shutdown.wait()));

    TestApi {
        base: format!("http://{}{}", addr, API_PREFIX),
        config_path: dir.path().join("haproxy.cfg"),
        shutdown,
        _dir: dir,
    }
}

/// Client that never reuses connections across tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
