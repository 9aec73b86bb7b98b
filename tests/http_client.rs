//! End-to-end checks of the HTTP clients against a stub conversion server.
#![cfg(not(target_arch = "wasm32"))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docx_uploader::health::{self, ServerHealth};
use docx_uploader::processing::{
    ConversionClient, ConversionError, HttpConversionClient, Upload,
};

/// What the stub saw for each request to the convert route.
#[derive(Debug, Clone, PartialEq)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct StubState {
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

async fn convert_handler(State(state): State<StubState>, mut multipart: Multipart) -> Response {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        fields.push(ReceivedField {
            name,
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    state.received.lock().unwrap().extend(fields.iter().cloned());

    match fields.as_slice() {
        [field] if field.name == "file" => {
            let mut body = b"DOCX:".to_vec();
            body.extend_from_slice(&field.bytes);
            (StatusCode::OK, body).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn stub_server() -> (String, StubState) {
    let state = StubState::default();
    let router = Router::new()
        .route("/md-to-docx/convert/", post(convert_handler))
        .route(
            "/md-to-docx/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        )
        .with_state(state.clone());
    (spawn_server(router).await, state)
}

fn report_upload() -> Upload {
    Upload {
        file_name: "report.md".to_owned(),
        bytes: Arc::from(&b"# Report\n\nBody text."[..]),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upload_is_sent_as_single_file_field() {
    let (server_url, state) = stub_server().await;
    let client = HttpConversionClient::new(server_url);

    let result = client.convert(report_upload()).block_and_take();

    let document = result.expect("conversion should succeed");
    assert_eq!(document.bytes, b"DOCX:# Report\n\nBody text.".to_vec());

    let received = state.received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![ReceivedField {
            name: "file".to_owned(),
            file_name: Some("report.md".to_owned()),
            bytes: b"# Report\n\nBody text.".to_vec(),
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_success_status_is_a_server_error() {
    let router = Router::new().route(
        "/md-to-docx/convert/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "pandoc exploded") }),
    );
    let server_url = spawn_server(router).await;
    let client = HttpConversionClient::new(server_url);

    let result = client.convert(report_upload()).block_and_take();

    assert_eq!(result, Err(ConversionError::Server(500)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_server_is_a_transport_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpConversionClient::new(format!("http://{}", addr));
    let result = client.convert(report_upload()).block_and_take();

    match result {
        Err(ConversionError::Transport(message)) => assert!(!message.is_empty()),
        other => panic!("expected a transport error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_probe_reports_online_server() {
    let (server_url, _state) = stub_server().await;
    let health = health::probe(&server_url).block_and_take();
    assert_eq!(health, ServerHealth::Online);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_probe_reports_missing_route_as_offline() {
    let server_url = spawn_server(Router::new()).await;
    let health = health::probe(&server_url).block_and_take();
    assert_eq!(health, ServerHealth::Offline("status 404".to_owned()));
}
