//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, port, worker pool size).
    pub listener: ListenerConfig,

    /// Ordered handler chain.
    pub chain: ChainConfig,

    /// Static resource settings.
    pub resources: ResourceConfig,

    /// REST routing policy.
    pub rest: RestConfig,

    /// Per-connection deadlines.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP literal to bind, v4 or v6 (e.g., "0.0.0.0" or "::").
    /// Hostnames are not resolved.
    pub bind_address: String,

    /// Listening port.
    pub port: u16,

    /// Size of the bounded worker pool.
    pub max_threads: usize,
}

impl ListenerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.bind_address.trim().parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Printable form of the bind target, valid or not.
    pub fn socket_address(&self) -> String {
        match self.socket_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => format!("{}:{}", self.bind_address, self.port),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 80,
            max_threads: 100,
        }
    }
}

/// Built-in request handlers that may appear in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// JSON endpoints resolved through the route registry.
    Rest,
    /// Files served from the resource directory.
    Resource,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Rest => write!(f, "rest"),
            HandlerKind::Resource => write!(f, "resource"),
        }
    }
}

/// Handler chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Handlers in execution order.
    pub handlers: Vec<HandlerKind>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            handlers: vec![HandlerKind::Rest, HandlerKind::Resource],
        }
    }
}

/// Static resource configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory scanned for web resources. "/" means the default directory.
    pub dir: String,

    /// Resource served when a shallow path has no exact match.
    pub default_page: String,

    /// `Cache-Control` max-age in seconds. Zero or less disables caching.
    pub cache_max_age: i64,

    /// Deepest path level that still falls back to the default page.
    pub max_path_level: usize,
}

pub(crate) const DEFAULT_RESOURCE_DIR: &str = "htdocs";

impl ResourceConfig {
    /// Resource directory with "/" mapped to the default directory.
    pub fn effective_dir(&self) -> &str {
        if self.dir == "/" {
            DEFAULT_RESOURCE_DIR
        } else {
            &self.dir
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_RESOURCE_DIR.to_string(),
            default_page: "main.html".to_string(),
            cache_max_age: 0,
            max_path_level: 1,
        }
    }
}

/// REST routing policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RestConfig {
    /// Answer 404 for unmapped endpoints and 500 for handler failures
    /// instead of 200 with an explanatory JSON message.
    pub strict_status_codes: bool,
}

/// Timeout configuration for a single exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for receiving the request line and headers, in seconds.
    pub read_secs: u64,

    /// Deadline for each response write, in seconds.
    pub write_secs: u64,

    /// How long `stop()` waits for in-flight connections, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
            drain_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
