use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use axum::routing::post;
use sms_smoke::{Client, ReqwestTransport, RestErrorKind, SmokeConfig, SmokeError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SEND_PATH: &str = "/api/auth/sms/send";

#[derive(Clone, Debug)]
struct Captured {
    content_type: Option<String>,
    body: Bytes,
}

#[derive(Clone, Default)]
struct AppState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

fn record(state: &AppState, headers: &HeaderMap, body: Bytes) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .expect("capture mutex")
        .push(Captured { content_type, body });
}

async fn ok_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    record(&state, &headers, body);
    (StatusCode::OK, r#"{"success":true}"#)
}

async fn limited_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    record(&state, &headers, body);
    (StatusCode::TOO_MANY_REQUESTS, r#"{"message":"too many requests"}"#)
}

struct TestServer {
    base_url: String,
    state: AppState,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route(SEND_PATH, post(ok_handler))
            .route("/limited", post(limited_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().expect("capture mutex").clone()
    }
}

fn direct_client() -> Client {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client");
    Client::with_transport(ReqwestTransport::with_client(client))
}

fn config_for(url: String) -> SmokeConfig {
    SmokeConfig {
        url,
        ..SmokeConfig::default()
    }
}

/// Address with nothing listening on it.
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}{SEND_PATH}")
}

fn binary(url: &str) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sms-smoke"));
    command
        .args(["--url", url])
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .env_remove("SMS_SMOKE_LOG");
    command
}

fn run_binary(url: &str) -> Output {
    binary(url).output().expect("spawn sms-smoke")
}

/// Serves one request, announcing a longer body than it sends before hanging up.
async fn truncating_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind truncating listener");
    let addr = listener.local_addr().expect("truncating address");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.ends_with(b"}") {
            let read = socket.read(&mut buf).await.expect("read request");
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buf[..read]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n{\"succ")
            .await
            .expect("write partial response");
        socket.shutdown().await.ok();
    });
    format!("http://{addr}{SEND_PATH}")
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_success_prints_status_and_body() {
    let server = TestServer::start().await;
    let mut out = Vec::new();

    sms_smoke::run(&direct_client(), &config_for(server.url(SEND_PATH)), &mut out)
        .await
        .expect("run");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Status Code: 200\nResponse: {\"success\":true}\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_request_shape_reaches_server() {
    let server = TestServer::start().await;

    sms_smoke::send(&direct_client(), &config_for(server.url(SEND_PATH)))
        .await
        .expect("send");

    let captured = server.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));

    let body: sonic_rs::Value = sonic_rs::from_slice(&captured[0].body).expect("json body");
    let expected: sonic_rs::Value =
        sonic_rs::from_str(r#"{"phone":"13800138000","scene":"LOGIN_REGISTER"}"#).expect("json");
    assert_eq!(body, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_too_many_requests_is_printed() {
    let server = TestServer::start().await;
    let mut out = Vec::new();

    sms_smoke::run(&direct_client(), &config_for(server.url("/limited")), &mut out)
        .await
        .expect("429 is a completed call");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Status Code: 429\nResponse: {\"message\":\"too many requests\"}\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_refused_connection_is_transport_error() {
    let url = refused_url().await;
    let mut out = Vec::new();

    let err = sms_smoke::run(&direct_client(), &config_for(url), &mut out)
        .await
        .expect_err("nothing is listening");

    match err {
        SmokeError::Transport(err) => assert_eq!(err.kind(), RestErrorKind::Connect),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_binary_exits_zero_on_error_status_and_is_repeatable() {
    let server = TestServer::start().await;
    let url = server.url("/limited");

    let (first, second) = tokio::task::spawn_blocking(move || (run_binary(&url), run_binary(&url)))
        .await
        .expect("binary runs");

    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    assert_eq!(
        String::from_utf8_lossy(&first.stdout),
        "Status Code: 429\nResponse: {\"message\":\"too many requests\"}\n"
    );
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(server.captured().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_binary_fails_without_status_line_when_refused() {
    let url = refused_url().await;

    let output = tokio::task::spawn_blocking(move || run_binary(&url))
        .await
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Status Code:"));
    assert!(!output.stderr.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_truncated_body_is_receive_error() {
    let url = truncating_url().await;
    let mut out = Vec::new();

    let err = sms_smoke::run(&direct_client(), &config_for(url), &mut out)
        .await
        .expect_err("body ends before content-length");

    match err {
        SmokeError::Transport(err) => assert_eq!(err.kind(), RestErrorKind::Receive),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_binary_debug_logs_stay_off_stdout() {
    let server = TestServer::start().await;
    let url = server.url(SEND_PATH);

    let output = tokio::task::spawn_blocking(move || {
        binary(&url)
            .env("SMS_SMOKE_LOG", "debug")
            .output()
            .expect("spawn sms-smoke")
    })
    .await
    .expect("binary runs");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Status Code: 200\nResponse: {\"success\":true}\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sending sms request"), "stderr: {stderr}");
    assert!(stderr.contains("sms endpoint answered"), "stderr: {stderr}");
}
