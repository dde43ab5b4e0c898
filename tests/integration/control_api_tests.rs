//! Integration tests for the HTTP control surface.
//!
//! Each test binds an ephemeral port and drives the router through
//! `reqwest`.

use std::sync::Arc;

use proman::http::server::serve_on;
use proman::manager::ProcessManager;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{failing, sleeper};

struct TestServer {
    base_url: String,
    manager: Arc<ProcessManager>,
    ct: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn(manager: ProcessManager) -> Self {
        let manager = Arc::new(manager);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral");
        let addr = listener.local_addr().expect("local addr");
        let ct = CancellationToken::new();

        let server_manager = Arc::clone(&manager);
        let server_ct = ct.clone();
        tokio::spawn(async move {
            let _ = serve_on(listener, server_manager, server_ct).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            manager,
            ct,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("request sent")
    }

    async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("request sent")
    }

    async fn shutdown(self) {
        self.manager.stop_all().await;
        self.ct.cancel();
    }
}

async fn two_process_server() -> TestServer {
    let manager = ProcessManager::new();
    manager.register(sleeper("api", false)).await;
    manager.register(failing("broken", false)).await;
    TestServer::spawn(manager).await
}

// ── Health ───────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let server = two_process_server().await;
    let resp = server.get("/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");
    server.shutdown().await;
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let server = two_process_server().await;
    assert_eq!(server.get("/nonexistent").await.status(), 404);
    server.shutdown().await;
}

// ── Status and listing ───────────────────────────────────

#[tokio::test]
async fn status_maps_names_to_statuses() {
    let server = two_process_server().await;
    let body: Value = server.get("/api/status").await.json().await.expect("json");
    assert_eq!(
        body,
        serde_json::json!({ "api": "not-started", "broken": "not-started" })
    );
    server.shutdown().await;
}

#[tokio::test]
async fn processes_lists_names() {
    let server = two_process_server().await;
    let body: Value = server.get("/api/processes").await.json().await.expect("json");
    assert_eq!(body, serde_json::json!(["api", "broken"]));
    server.shutdown().await;
}

// ── Lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn start_and_stop_by_name() {
    let server = two_process_server().await;

    let resp = server.post("/api/start/api").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["outcome"]["status"], "running");
    assert!(body["result"].as_str().unwrap().contains("started"));

    let body: Value = server.get("/api/info/api").await.json().await.expect("json");
    assert_eq!(body["name"], "api");
    assert_eq!(body["kind"], "ShellProcess");
    assert_eq!(body["status"], "running");
    assert_eq!(body["command"], "exec sleep 30");
    assert!(body["pid"].is_u64());

    let resp = server.post("/api/stop/api").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["outcome"]["status"], "stopped");

    server.shutdown().await;
}

#[tokio::test]
async fn failed_start_is_reported_in_outcome() {
    let server = two_process_server().await;
    let body: Value = server
        .post("/api/start/broken")
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(body["outcome"]["ok"], false);
    assert_eq!(body["outcome"]["status"], "failed");
    server.shutdown().await;
}

#[tokio::test]
async fn unknown_process_returns_404_with_detail() {
    let server = two_process_server().await;

    for resp in [
        server.post("/api/start/missing").await,
        server.post("/api/stop/missing").await,
        server.get("/api/info/missing").await,
    ] {
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.expect("json");
        assert!(body["detail"].as_str().unwrap().contains("missing"));
    }

    server.shutdown().await;
}

#[tokio::test]
async fn start_all_and_stop_all_return_outcomes() {
    let server = two_process_server().await;

    let body: Value = server.post("/api/start-all").await.json().await.expect("json");
    let outcomes = body.as_array().expect("outcome list");
    assert_eq!(outcomes.len(), 2);

    let status: Value = server.get("/api/status").await.json().await.expect("json");
    assert_eq!(status["api"], "running");
    assert_eq!(status["broken"], "failed");

    let body: Value = server.post("/api/stop-all").await.json().await.expect("json");
    assert!(body
        .as_array()
        .expect("outcome list")
        .iter()
        .all(|outcome| outcome["ok"] == true));

    server.shutdown().await;
}
