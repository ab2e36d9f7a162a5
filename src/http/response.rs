//! Response construction and wire encoding.
//!
//! # Responsibilities
//! - Model the (status, headers, body) triple of one exchange
//! - Encode it as a raw HTTP/1.1 response
//! - Write it to the connection under a deadline
//!
//! # Design Decisions
//! - `Allow: GET` is always emitted, mirroring the single-method policy
//! - `Content-length` is always the exact byte length of the body
//! - Responses are built and written in one pass, never retained

use std::io;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Value of the `Allow` header on every response.
pub const ALLOW: &str = "GET";

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

const NO_CACHE: &str = "0, no-cache, must-revalidate, proxy-revalidate";

/// Status codes produced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    content_type: String,
    cache_control: Option<String>,
    body: Vec<u8>,
}

impl Response {
    /// Text response with an explicit content type.
    pub fn text(status: Status, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            cache_control: None,
            body: body.into().into_bytes(),
        }
    }

    /// `text/plain` response.
    pub fn plain(status: Status, body: impl Into<String>) -> Self {
        Self::text(status, TEXT_PLAIN, body)
    }

    /// `application/json` response from an already encoded document.
    pub fn json(status: Status, body: impl Into<String>) -> Self {
        Self::text(status, APPLICATION_JSON, body)
    }

    /// JSON object with a single `message` field.
    pub fn json_message(status: Status, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "message": message }).to_string())
    }

    /// `200 OK` carrying raw resource bytes with a cache directive.
    pub fn resource(body: Vec<u8>, content_type: impl Into<String>, cache_max_age: i64) -> Self {
        Self {
            status: Status::Ok,
            content_type: content_type.into(),
            cache_control: Some(cache_control(cache_max_age)),
            body,
        }
    }

    /// 405 for a verb outside the allow-list.
    pub fn method_not_allowed(method: &str) -> Self {
        Self::plain(
            Status::MethodNotAllowed,
            format!("Method Not Allowed: {}", method),
        )
    }

    /// 404 for a static resource that does not exist.
    pub fn resource_not_found(path: &str) -> Self {
        Self::plain(Status::NotFound, format!("Resource not found: {}", path))
    }

    /// Generic 500. Never carries the cause.
    pub fn internal_server_error() -> Self {
        Self::plain(Status::InternalServerError, Status::InternalServerError.reason())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn cache_control(&self) -> Option<&str> {
        self.cache_control.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Status line and headers, including the terminating blank line.
    pub fn head(&self) -> String {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nAllow: {}\r\nContent-type: {}\r\nContent-length: {}\r\n",
            self.status.code(),
            self.status.reason(),
            ALLOW,
            self.content_type,
            self.body.len()
        );
        if let Some(cache_control) = &self.cache_control {
            head.push_str("Cache-Control: max-age=");
            head.push_str(cache_control);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head
    }

    /// Complete wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = self.head();
        let mut bytes = Vec::with_capacity(head.len() + self.body.len());
        bytes.extend_from_slice(head.as_bytes());
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// `max-age` value: the configured seconds when positive, otherwise a no-cache directive.
pub fn cache_control(cache_max_age: i64) -> String {
    if cache_max_age > 0 {
        cache_max_age.to_string()
    } else {
        NO_CACHE.to_string()
    }
}

/// Writes responses to the output side of one connection.
pub struct ResponseWriter<W> {
    out: W,
    write_timeout: Option<Duration>,
    committed: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(out: W) -> Self {
        Self {
            out,
            write_timeout: None,
            committed: false,
        }
    }

    /// Bound every write (including flush) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// True once any response bytes have been handed to the connection.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Encode and flush one response.
    pub async fn write(&mut self, response: &Response) -> io::Result<()> {
        let bytes = response.to_bytes();
        self.committed = true;

        let out = &mut self.out;
        let write = async move {
            out.write_all(&bytes).await?;
            out.flush().await
        };
        match self.write_timeout {
            Some(limit) => tokio::time::timeout(limit, write)
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "response write timed out"))?,
            None => write.await,
        }?;

        tracing::trace!(
            status = response.status.code(),
            content_type = %response.content_type,
            content_length = response.body.len(),
            "Response written"
        );
        Ok(())
    }

    /// Flush and close the output side.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.out.shutdown().await
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
