//! End-to-end registration runs against a mock Klok API.

use klok_client::{ClientOptions, KlokClient};
use klok_registrar::{input, ProxyPool, Registrar, ResultSink, RunSettings};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wallet_signer::Identity;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn key(i: u64) -> String {
    format!("0x{:064x}", i)
}

fn address(i: u64) -> String {
    Identity::from_private_key(&key(i)).unwrap().checksum_address()
}

fn test_client(mock_server: &MockServer) -> Arc<KlokClient> {
    Arc::new(
        KlokClient::new(ClientOptions {
            base_url: format!("{}/v1", mock_server.uri()),
            ip_echo_url: format!("{}/ip", mock_server.uri()),
            referral_code: "TESTCODE".into(),
            origin: "https://klokapp.ai".into(),
            referer: "https://klokapp.ai/".into(),
            timeout: Duration::from_secs(5),
            ip_lookup_timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

async fn mount_ip(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ip": "203.0.113.9" })),
        )
        .mount(mock_server)
        .await;
}

fn settings(max_retries: u32) -> RunSettings {
    RunSettings {
        concurrency: 4,
        max_retries,
        ..RunSettings::default()
    }
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

async fn create_sink(dir: &TempDir) -> Arc<ResultSink> {
    Arc::new(
        ResultSink::create(dir.path().join("success.txt"), dir.path().join("fail.txt"))
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn test_three_keys_all_registered() {
    let mock_server = MockServer::start().await;
    mount_ip(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "session_token": "abc" })),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let keys_file = dir.path().join("priv.txt");
    std::fs::write(&keys_file, format!("{}\n\n  {}  \n{}\n", key(1), key(2), key(3))).unwrap();

    let keys = input::read_lines(&keys_file).await.unwrap();
    let sink = create_sink(&dir).await;
    let registrar = Registrar::new(test_client(&mock_server), Arc::clone(&sink), settings(5));

    let summary = registrar.run(keys, Arc::new(ProxyPool::empty())).await;

    assert_eq!(summary.registered, 3);
    let mut success = lines(sink.success_path());
    success.sort();
    let mut expected: Vec<_> = (1..=3)
        .map(|i| format!("{}:{}:abc", address(i), key(i)))
        .collect();
    expected.sort();
    assert_eq!(success, expected);
    assert!(lines(sink.failure_path()).is_empty());
}

#[tokio::test]
async fn test_failing_api_exhausts_retries() {
    let mock_server = MockServer::start().await;
    mount_ip(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(500).set_body_string("maintenance"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = create_sink(&dir).await;
    let registrar = Registrar::new(test_client(&mock_server), Arc::clone(&sink), settings(5));

    let summary = registrar.run(vec![key(1)], Arc::new(ProxyPool::empty())).await;

    assert_eq!(summary.failed, 1);
    assert!(lines(sink.success_path()).is_empty());
    assert_eq!(
        lines(sink.failure_path()),
        vec![format!("{}:{}", address(1), key(1))]
    );
}

#[tokio::test]
async fn test_malformed_key_skipped() {
    let mock_server = MockServer::start().await;
    mount_ip(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = create_sink(&dir).await;
    let registrar = Registrar::new(test_client(&mock_server), Arc::clone(&sink), settings(1));

    let keys = vec![key(1), "0xnot-a-private-key".to_string(), key(2)];
    let summary = registrar.run(keys, Arc::new(ProxyPool::empty())).await;

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(
        lines(sink.success_path()).len() + lines(sink.failure_path()).len(),
        2
    );
}

#[tokio::test]
async fn test_ip_lookup_down_still_registers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "session_token": "tok" })),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = create_sink(&dir).await;
    let registrar = Registrar::new(test_client(&mock_server), Arc::clone(&sink), settings(5));

    let summary = registrar.run(vec![key(4)], Arc::new(ProxyPool::empty())).await;

    assert_eq!(summary.registered, 1);
    assert_eq!(lines(sink.success_path()).len(), 1);
}

#[tokio::test]
async fn test_rerun_truncates_outputs() {
    let mock_server = MockServer::start().await;
    mount_ip(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "session_token": "t" })),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();

    for _ in 0..2 {
        let sink = create_sink(&dir).await;
        let registrar = Registrar::new(test_client(&mock_server), Arc::clone(&sink), settings(5));
        registrar
            .run(vec![key(1), key(2)], Arc::new(ProxyPool::empty()))
            .await;
    }

    assert_eq!(lines(&dir.path().join("success.txt")).len(), 2);
    assert!(lines(&dir.path().join("fail.txt")).is_empty());
}
