//! Error taxonomy for the server.
//!
//! # Design Decisions
//! - Per-request failures (`RequestError`, `HandlerError`) become HTTP
//!   responses and never take down a worker or the server
//! - `StartupError` is fatal: nothing is accepted until startup succeeds
//! - Handler causes are logged, never written to the client

use std::path::PathBuf;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Boxed error used at the boundary with application-supplied handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to turn a byte stream into a [`Request`](crate::http::Request).
#[derive(Debug, Error)]
pub enum RequestError {
    /// Request line missing, truncated, oversized or not UTF-8.
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// The connection failed while reading.
    #[error("I/O error while reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Two handlers were registered for the same route path.
    #[error("Duplicate route \"{path}\" at: {existing} and {duplicate}")]
    DuplicateRoute {
        path: String,
        existing: String,
        duplicate: String,
    },

    /// A shared service instance could not be constructed.
    #[error("Failed to construct shared instance of {service}: {source}")]
    InstanceConstruction {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// The static resource directory could not be scanned.
    #[error("Resource directory {path:?} is not readable: {source}")]
    ResourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listening socket could not be bound.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Errors surfaced by a handler in the chain.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The route handler (or the per-call instance constructor) failed.
    #[error("Handler for route \"{route}\" failed: {source}")]
    Invocation {
        route: String,
        #[source]
        source: BoxError,
    },

    /// The handler result could not be converted to JSON.
    #[error("Failed to serialize result of route \"{route}\": {source}")]
    Serialization {
        route: String,
        #[source]
        source: serde_json::Error,
    },

    /// A static resource existed in the catalog but could not be read.
    #[error("Failed to read resource {path:?}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listening socket.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while the server was already accepting.
    #[error("Server is already started")]
    AlreadyStarted,
}
