//! Request parsing into an immutable snapshot.
//!
//! # Responsibilities
//! - Read exactly one request line and the header block from a byte stream
//! - Split the request target into path and query
//! - Generate a unique request ID (UUID v4)
//! - Classify the request as JSON or not from its `Accept` header
//!
//! # Design Decisions
//! - A `Request` is either fully built or parsing fails; nothing partial escapes
//! - Header parsing is lenient: a line without a colon ends the header block
//! - Repeated header keys keep the last value
//! - The request never touches the output side of the connection

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use uuid::Uuid;

use crate::error::RequestError;

/// Longest accepted request or header line, in bytes.
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Largest accepted number of header lines.
pub const MAX_HEADERS: usize = 100;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Unique identifier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable snapshot of one HTTP request line and its headers.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: String,
    request_line: String,
    uri: String,
    path: String,
    path_level: usize,
    headers: HashMap<String, String>,
    accept: Option<String>,
    peer_addr: Option<SocketAddr>,
}

impl Request {
    /// Parse a request from a buffered stream positioned at the start of an exchange.
    pub async fn parse<R>(reader: &mut R, peer_addr: Option<SocketAddr>) -> Result<Self, RequestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let request_line = match read_line(reader).await? {
            Some(line) => line,
            None => return Err(RequestError::Malformed("empty request".into())),
        };

        let mut tokens = request_line.split_whitespace();
        let (method, uri) = match (tokens.next(), tokens.next()) {
            (Some(method), Some(uri)) => (method.to_string(), uri.to_string()),
            _ => {
                return Err(RequestError::Malformed(format!(
                    "request line \"{}\" lacks a method and URI",
                    request_line
                )))
            }
        };

        let headers = read_headers(reader).await?;
        Ok(Self::from_parts(method, request_line, uri, headers, peer_addr))
    }

    /// Assemble a request from already-split parts.
    pub fn from_parts(
        method: String,
        request_line: String,
        uri: String,
        headers: HashMap<String, String>,
        peer_addr: Option<SocketAddr>,
    ) -> Self {
        let path = match uri.find('?') {
            Some(idx) => uri[..idx].to_string(),
            None => uri.clone(),
        };
        let path_level = path.matches('/').count();
        let accept = headers
            .get("Accept")
            .or_else(|| {
                headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("accept"))
                    .map(|(_, value)| value)
            })
            .cloned();

        Self {
            id: RequestId::new(),
            method,
            request_line,
            uri,
            path,
            path_level,
            headers,
            accept,
            peer_addr,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// HTTP verb, first token of the request line.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw request line, without the line terminator.
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    /// Raw request target, query included.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request target with the query component removed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of `/` characters in the path.
    pub fn path_level(&self) -> usize {
        self.path_level
    }

    /// Query component after the first `?`, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.find('?').map(|idx| &self.uri[idx + 1..])
    }

    /// First decoded value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Headers as received (names keep their original case).
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// True when the client asked for `application/json`.
    pub fn is_json_request(&self) -> bool {
        self.accept
            .as_deref()
            .map(|accept| accept.starts_with(JSON_MEDIA_TYPE))
            .unwrap_or(false)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

/// Read one line, stripped of its terminator. `None` at end of stream.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if !buf.ends_with(b"\n") && read as u64 == MAX_LINE_BYTES {
        return Err(RequestError::Malformed(format!(
            "line exceeds {} bytes",
            MAX_LINE_BYTES
        )));
    }

    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| RequestError::Malformed("line is not valid UTF-8".into()))
}

async fn read_headers<R>(reader: &mut R) -> Result<HashMap<String, String>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HashMap::new();
    let mut lines = 0;

    while let Some(line) = read_line(reader).await? {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            break;
        };
        lines += 1;
        if lines > MAX_HEADERS {
            return Err(RequestError::Malformed(format!(
                "more than {} header lines",
                MAX_HEADERS
            )));
        }
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    Ok(headers)
}
