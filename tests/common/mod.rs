//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use microserver::config::{HandlerKind, ServerConfig};
use microserver::routing::{InstanceMode, RestService, RouteRegistry, RouteRegistryBuilder};
use microserver::{BoxError, Request, Server, ServerError};

/// Services used by the integration tests.
pub struct Api;

impl RestService for Api {
    fn instance_mode() -> InstanceMode {
        InstanceMode::Shared
    }

    fn create() -> Result<Self, BoxError> {
        Ok(Api)
    }
}

#[derive(Serialize)]
pub struct Echo {
    pub path: String,
    pub name: Option<String>,
}

impl Api {
    pub fn ok(&self) -> Result<Value, BoxError> {
        Ok(json!({ "ok": true }))
    }

    pub fn fail(&self) -> Result<Value, BoxError> {
        Err("database unavailable".into())
    }

    pub fn boom(&self) -> Result<Value, BoxError> {
        let rows: Vec<Value> = Vec::new();
        Ok(rows[0].clone())
    }

    pub fn echo(&self, request: &Request) -> Result<Echo, BoxError> {
        Ok(Echo {
            path: request.path().to_string(),
            name: request.query_param("name"),
        })
    }
}

pub fn routes() -> RouteRegistryBuilder {
    RouteRegistry::builder()
        .get("/status", Api::ok)
        .get("/fail", Api::fail)
        .get_with_request("/echo", "Api::echo", Api::echo)
}

/// Resource directory with an index page, a default page and nested files.
pub fn resources() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>Hi</h1>").unwrap();
    fs::write(dir.path().join("main.html"), "<h1>Main</h1>").unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/guide.txt"), "read me").unwrap();
    fs::write(dir.path().join("logo.PNG"), [0x89, b'P', b'N', b'G']).unwrap();
    dir
}

/// Loopback config serving `resources`, with short deadlines.
pub fn config(resources: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;
    config.listener.max_threads = 8;
    config.chain.handlers = vec![HandlerKind::Rest, HandlerKind::Resource];
    config.resources.dir = resources.to_string_lossy().into_owned();
    config.timeouts.read_secs = 2;
    config.timeouts.write_secs = 2;
    config.timeouts.drain_secs = 2;
    config
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub server: Arc<Server>,
    pub addr: SocketAddr,
    handle: JoinHandle<Result<(), ServerError>>,
    _resources: Option<TempDir>,
}

impl TestServer {
    /// Stop the server and wait for `serve` to return.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.server.stop();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

/// Start a server with the default test routes and resources.
pub async fn start() -> TestServer {
    let dir = resources();
    let config = config(dir.path());
    let mut server = start_with(config, routes().build().unwrap()).await;
    server._resources = Some(dir);
    server
}

pub async fn start_with(config: ServerConfig, registry: RouteRegistry) -> TestServer {
    let server = Arc::new(Server::new(config, registry).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener).await })
    };
    while !server.is_started() {
        tokio::task::yield_now().await;
    }

    TestServer {
        server,
        addr,
        handle,
        _resources: None,
    }
}

/// Send raw bytes and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    response
}

pub async fn send(addr: SocketAddr, raw: &str) -> String {
    String::from_utf8_lossy(&send_raw(addr, raw.as_bytes()).await).into_owned()
}

/// A response split into its parts.
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn parse(raw: &str) -> Self {
        let (head, body) = raw.split_once("\r\n\r\n").expect("no header terminator");
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self {
            status_line,
            headers,
            body: body.to_string(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("body is not JSON")
    }
}

pub async fn get(addr: SocketAddr, path: &str, accept: Option<&str>) -> RawResponse {
    let mut request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n", path);
    if let Some(accept) = accept {
        request.push_str(&format!("Accept: {}\r\n", accept));
    }
    request.push_str("\r\n");
    RawResponse::parse(&send(addr, &request).await)
}
