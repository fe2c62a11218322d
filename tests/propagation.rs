//! Peer propagation across discovery modes.

use serde_json::Value;

mod common;

async fn reconfigure(api: &common::TestApi, name: &str) -> reqwest::Response {
    let path = format!("/{}", name);
    common::client()
        .get(format!("{}/reconfigure", api.base))
        .query(&[("serviceName", name), ("servicePath", path.as_str()), ("port", "8080")])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_default_mode_calls_every_registry_peer() {
    let healthy = common::start_mock_peer(200).await;
    let broken = common::start_mock_peer(500).await;
    let addresses = format!("{},{}", healthy.addr, broken.base_url());
    let api = common::start_api(|config| {
        config.registry.addresses = vec![addresses];
        config.discovery.instance_name = "edge".to_string();
    })
    .await;
    let before = healthy.requests().len();
    let broken_before = broken.requests().len();

    let res = reconfigure(&api, "shop").await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["peers"].as_array().unwrap().len(), 2);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);

    let requests = healthy.requests();
    assert_eq!(requests.len(), before + 1);
    let last = requests.last().unwrap();
    assert!(last.starts_with("POST /v1/proxy/reload-all?"));
    assert!(last.contains("instance=edge"));
    assert!(last.contains("mode=default"));
    assert_eq!(broken.requests().len(), broken_before + 1);
}

#[tokio::test]
async fn test_every_peer_failing_is_an_error() {
    let broken = common::start_mock_peer(503).await;
    let base = broken.base_url();
    let api = common::start_api(|config| {
        config.registry.addresses = vec![base];
    })
    .await;

    let res = reconfigure(&api, "shop").await;
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "NOK");
    assert!(body["message"].as_str().unwrap().contains("503"));

    // The local proxy still carries the change.
    let config = std::fs::read_to_string(&api.config_path).unwrap();
    assert!(config.contains("backend shop-be"));
}

#[tokio::test]
async fn test_service_mode_never_calls_peers() {
    let peer = common::start_mock_peer(200).await;
    let base = peer.base_url();
    let api = common::start_api(|config| {
        config.registry.addresses = vec![base];
        config.discovery.mode = "service".to_string();
    })
    .await;

    assert_eq!(reconfigure(&api, "shop").await.status(), 200);
    assert!(peer.requests().is_empty());
}

#[tokio::test]
async fn test_peer_reload_all_does_not_echo() {
    let peer = common::start_mock_peer(200).await;
    let base = peer.base_url();
    let api = common::start_api(|config| {
        config.registry.addresses = vec![base];
    })
    .await;
    let before = peer.requests().len();

    let res = common::client()
        .post(format!("{}/reload-all", api.base))
        .query(&[("instance", "other"), ("mode", "default")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(peer.requests().len(), before);
}

#[tokio::test]
async fn test_swarm_mode_notifies_listener() {
    let registry = common::start_mock_peer(200).await;
    let listener = common::start_mock_peer(200).await;
    let registry_base = registry.base_url();
    let listener_address = listener.addr.to_string();
    let api = common::start_api(|config| {
        config.registry.addresses = vec![registry_base];
        config.discovery.mode = "swarm".to_string();
        config.discovery.listener_address = Some(listener_address);
    })
    .await;
    let before = listener.requests().len();

    // "localhost" resolves through the system resolver like a swarm service name.
    let res = reconfigure(&api, "localhost").await;
    assert_eq!(res.status(), 200);

    let requests = listener.requests();
    assert_eq!(requests.len(), before + 1);
    assert_eq!(
        requests.last().unwrap(),
        "GET /v1/swarm-listener/notify-services"
    );
    assert!(registry.requests().is_empty());

    let config = std::fs::read_to_string(&api.config_path).unwrap();
    assert!(config.contains("backend localhost-be"));
    assert!(config.contains(":8080 check"));
}
