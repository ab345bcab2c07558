//! End-to-end: real server on an ephemeral port, dashboard over HTTP.
//!
//! Run with:
//!   cargo test --test test_dashboard_e2e

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use demoapp::config::default_endpoints;
use demoapp::dashboard::{
    EndpointAggregator, EndpointDescriptor, HttpTransport, OutcomeData, TerminalRenderer, Transport,
    TransportFuture, drive,
};
use demoapp::server::{ApiState, serve};
use demoapp::store::{CredentialVerifier, ItemStore};

// ── helpers ──────────────────────────────────────────────────────────────────

struct RunningServer {
    _tmp: TempDir,
    base_url: String,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), demoapp::error::AppError>>,
}

impl RunningServer {
    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

async fn start_server(items: Option<&str>) -> RunningServer {
    let tmp = TempDir::new().expect("tempdir");
    let items_path = tmp.path().join("items.json");
    let creds_path = tmp.path().join("credentials.json");
    if let Some(items) = items {
        fs::write(&items_path, items).unwrap();
    }
    fs::write(&creds_path, r#"{"username": "admin", "password": "password"}"#).unwrap();

    let state = ApiState::new(ItemStore::new(items_path), CredentialVerifier::new(creds_path), 64 * 1024);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(serve(listener, state, shutdown.clone()));

    RunningServer {
        _tmp: tmp,
        base_url,
        shutdown,
        handle,
    }
}

fn aggregator(base_url: &str, descriptors: Vec<EndpointDescriptor>) -> EndpointAggregator {
    let transport = HttpTransport::new(base_url, Duration::from_secs(5)).unwrap();
    EndpointAggregator::new(Arc::new(transport), descriptors)
}

// ── tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_five_endpoints_in_order() {
    let server = start_server(Some(r#"[{"id": 7}]"#)).await;
    let agg = aggregator(&server.base_url, default_endpoints());

    agg.activate_all().await;
    let state = agg.state();

    assert!(!state.loading);
    let labels: Vec<&str> = state.results.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["Root", "Hello", "Data", "Compute", "Items"]);
    assert!(state.results.iter().all(|o| !o.data.is_error()));
    assert_eq!(
        state.results[1].data,
        OutcomeData::Json(json!({"message": "Hello from the API!"}))
    );
    assert_eq!(state.results[4].data, OutcomeData::Json(json!({"items": [{"id": 7}]})));

    server.stop().await;
}

#[tokio::test]
async fn server_error_body_is_still_data() {
    let server = start_server(None).await;
    let agg = aggregator(&server.base_url, default_endpoints());

    agg.activate_one("/api/items").await;
    let state = agg.state();
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].label, "/api/items");
    assert_eq!(
        state.results[0].data,
        OutcomeData::Json(json!({"error": "Could not read items.json"}))
    );

    server.stop().await;
}

#[tokio::test]
async fn unreachable_endpoints_do_not_abort_the_pass() {
    let server = start_server(Some("[]")).await;
    let dead_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    // Three of five calls go to a port nobody listens on.
    let live = Arc::new(HttpTransport::new(&server.base_url, Duration::from_secs(5)).unwrap());
    let dead = Arc::new(HttpTransport::new(format!("http://127.0.0.1:{dead_port}"), Duration::from_secs(5)).unwrap());
    let transport = Arc::new(SplitTransport { live, dead });
    let agg = EndpointAggregator::new(transport, default_endpoints());

    agg.activate_all().await;
    let state = agg.state();

    assert_eq!(state.results.len(), 5);
    let errors: Vec<bool> = state.results.iter().map(|o| o.data.is_error()).collect();
    assert_eq!(errors, [true, false, true, false, true]);
    for outcome in state.results.iter().filter(|o| o.data.is_error()) {
        let OutcomeData::Error(text) = &outcome.data else { unreachable!() };
        assert!(text.starts_with("Error: "), "{text}");
    }
    let paths: Vec<&str> = state.results.iter().map(|o| o.path.as_str()).collect();
    assert_eq!(paths, ["/api", "/api/hello", "/api/data", "/api/compute", "/api/items"]);

    server.stop().await;
}

#[tokio::test]
async fn non_json_response_is_decode_error() {
    // One-shot HTTP responder that answers with plain text.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello")
                .await;
        }
    });

    let agg = aggregator(&format!("http://{addr}"), default_endpoints());
    agg.activate_one("/api/hello").await;
    let state = agg.state();
    let OutcomeData::Error(text) = &state.results[0].data else {
        panic!("expected an error outcome, got {:?}", state.results[0].data);
    };
    assert!(text.starts_with("Error: invalid JSON body"), "{text}");
}

#[tokio::test]
async fn renderer_receives_final_state() {
    let server = start_server(Some(r#"["x"]"#)).await;
    let agg = aggregator(&server.base_url, default_endpoints());
    let render = tokio::spawn(drive(agg.subscribe(), TerminalRenderer::new(Vec::new())));

    agg.activate_all().await;
    drop(agg);

    let out = String::from_utf8(render.await.unwrap().into_inner()).unwrap();
    for header in ["== Root (/api)", "== Hello (/api/hello)", "== Items (/api/items)"] {
        assert!(out.contains(header), "missing {header} in:\n{out}");
    }

    server.stop().await;
}

// ── split transport ──────────────────────────────────────────────────────────

/// Routes `/api`, `/api/data` and `/api/items` to a dead address.
struct SplitTransport {
    live: Arc<HttpTransport>,
    dead: Arc<HttpTransport>,
}

impl Transport for SplitTransport {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a> {
        match path {
            "/api" | "/api/data" | "/api/items" => self.dead.get(path),
            _ => self.live.get(path),
        }
    }
}
