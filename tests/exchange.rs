//! End-to-end request/response exchanges over real sockets.

mod common;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use microserver::config::HandlerKind;
use microserver::{BoxError, RestService, RouteRegistry};

use common::{get, send, RawResponse};

#[tokio::test]
async fn json_status_route_exact_wire_format() {
    let server = common::start().await;

    let raw = send(
        server.addr,
        "GET /status HTTP/1.1\r\nAccept: application/json\r\n\r\n",
    )
    .await;
    assert_eq!(
        raw,
        "HTTP/1.1 200 OK\r\n\
         Allow: GET\r\n\
         Content-type: application/json\r\n\
         Content-length: 11\r\n\
         \r\n\
         {\"ok\":true}"
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn static_index_with_cache_max_age() {
    let dir = common::resources();
    let mut config = common::config(dir.path());
    config.resources.cache_max_age = 3600;
    let server = common::start_with(config, RouteRegistry::empty()).await;

    let response = get(server.addr, "/index.html", Some("text/html")).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.header("Content-type"), Some("text/html"));
    assert_eq!(response.header("Cache-Control"), Some("max-age=3600"));
    assert_eq!(response.header("Content-length"), Some("11"));
    assert_eq!(response.body, "<h1>Hi</h1>");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn static_without_cache_sends_no_cache_directive() {
    let server = common::start().await;

    let response = get(server.addr, "/docs/guide.txt", None).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.header("Content-type"), Some("text/plain"));
    assert_eq!(
        response.header("Cache-Control"),
        Some("max-age=0, no-cache, must-revalidate, proxy-revalidate")
    );
    assert_eq!(response.body, "read me");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn binary_resource_bytes_are_exact() {
    let server = common::start().await;

    let raw = common::send_raw(server.addr, b"GET /logo.PNG HTTP/1.1\r\n\r\n").await;
    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let head = String::from_utf8_lossy(&raw[..split]);
    assert!(head.contains("Content-type: image/png"));
    assert!(head.contains("Content-length: 4"));
    assert_eq!(&raw[split + 4..], &[0x89, b'P', b'N', b'G']);

    server.stop().await.unwrap();
}

static CHAIN_HITS: AtomicUsize = AtomicUsize::new(0);

struct Counted;

impl RestService for Counted {
    fn create() -> Result<Self, BoxError> {
        Ok(Counted)
    }
}

impl Counted {
    fn hit(&self) -> Result<bool, BoxError> {
        CHAIN_HITS.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[tokio::test]
async fn non_get_methods_are_rejected_before_the_chain() {
    let dir = common::resources();
    let registry = RouteRegistry::builder().get("/hit", Counted::hit).build().unwrap();
    let server = common::start_with(common::config(dir.path()), registry).await;

    for method in ["POST", "PUT", "DELETE", "OPTIONS"] {
        let raw = send(
            server.addr,
            &format!("{} /hit HTTP/1.1\r\nAccept: application/json\r\n\r\n", method),
        )
        .await;
        let response = RawResponse::parse(&raw);
        assert_eq!(response.status_line, "HTTP/1.1 405 Method Not Allowed");
        assert_eq!(response.header("Allow"), Some("GET"));
        assert_eq!(response.header("Content-type"), Some("text/plain"));
        assert!(response.body.contains("Not Allowed"));
        assert!(response.body.contains(method));
    }
    assert_eq!(CHAIN_HITS.load(Ordering::SeqCst), 0, "handler chain ran for a rejected method");

    let response = get(server.addr, "/hit", Some("application/json")).await;
    assert_eq!(response.body, "true");
    assert_eq!(CHAIN_HITS.load(Ordering::SeqCst), 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn unmapped_rest_path_is_soft_200() {
    let server = common::start().await;

    let response = get(server.addr, "/nope", Some("application/json")).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.header("Content-type"), Some("application/json"));
    let message = response.json()["message"].as_str().unwrap().to_string();
    assert!(message.contains("/nope"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn strict_status_codes_use_404_and_500() {
    let dir = common::resources();
    let mut config = common::config(dir.path());
    config.rest.strict_status_codes = true;
    let server = common::start_with(config, common::routes().build().unwrap()).await;

    let missing = get(server.addr, "/nope", Some("application/json")).await;
    assert_eq!(missing.status_line, "HTTP/1.1 404 Not Found");

    let failed = get(server.addr, "/fail", Some("application/json")).await;
    assert_eq!(failed.status_line, "HTTP/1.1 500 Internal Server Error");
    assert!(!failed.body.contains("database unavailable"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn failing_handler_hides_cause() {
    let server = common::start().await;

    let response = get(server.addr, "/fail", Some("application/json")).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert!(response.json()["message"].is_string());
    assert!(!response.body.contains("database unavailable"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn handler_receives_request_query() {
    let server = common::start().await;

    let response = get(server.addr, "/echo?name=ada%20l", Some("application/json")).await;
    let body = response.json();
    assert_eq!(body["path"], "/echo");
    assert_eq!(body["name"], "ada l");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn missing_static_resource_names_path() {
    let server = common::start().await;

    let response = get(server.addr, "/docs/missing.html", Some("text/html")).await;
    assert_eq!(response.status_line, "HTTP/1.1 404 Not Found");
    assert_eq!(response.header("Content-type"), Some("text/plain"));
    assert!(response.body.contains("/docs/missing.html"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn shallow_paths_fall_back_to_default_page() {
    let server = common::start().await;

    for path in ["/", "/unknown", "/?q=1"] {
        let response = get(server.addr, path, None).await;
        assert_eq!(response.status_line, "HTTP/1.1 200 OK", "path {}", path);
        assert_eq!(response.body, "<h1>Main</h1>");
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn deeper_max_path_level_extends_fallback() {
    let dir = common::resources();
    let mut config = common::config(dir.path());
    config.resources.max_path_level = 2;
    let server = common::start_with(config, RouteRegistry::empty()).await;

    let response = get(server.addr, "/docs/missing.html", None).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.body, "<h1>Main</h1>");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn resource_edits_are_served_without_restart() {
    let dir = common::resources();
    let config = common::config(dir.path());
    let server = common::start_with(config, RouteRegistry::empty()).await;

    fs::write(dir.path().join("index.html"), "<h1>Edited</h1>").unwrap();
    let response = get(server.addr, "/index.html", None).await;
    assert_eq!(response.body, "<h1>Edited</h1>");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn rest_only_chain_ignores_non_json_requests() {
    let dir = common::resources();
    let mut config = common::config(dir.path());
    config.chain.handlers = vec![HandlerKind::Rest];
    let server = common::start_with(config, common::routes().build().unwrap()).await;

    let raw = send(server.addr, "GET /status HTTP/1.1\r\n\r\n").await;
    assert!(raw.is_empty());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn http_client_reads_json_route() {
    let server = common::start().await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/status", server.addr))
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));

    server.stop().await.unwrap();
}
