//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address and port
//! - Accept incoming TCP connections
//! - Report the bound address (port 0 resolves here)
//!
//! Concurrency limits live in the worker pool, not here: accepting never
//! waits for a free worker.

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;
use crate::error::ServerError;

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `bind_address:port`; the address must be an IP literal.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ServerError> {
        let address = config.socket_address();
        let bind_error = |source: io::Error| ServerError::Bind {
            address: address.clone(),
            source,
        };

        let addr = config
            .socket_addr()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;

        let listener = Self::from_tcp(listener).map_err(bind_error)?;
        tracing::info!(
            address = %listener.local_addr,
            max_threads = config.max_threads,
            "Listener bound"
        );
        Ok(listener)
    }

    /// Wrap an already bound socket.
    pub fn from_tcp(inner: TcpListener) -> io::Result<Self> {
        let local_addr = inner.local_addr()?;
        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer_addr) = self.inner.accept().await?;
        tracing::trace!(peer_addr = %peer_addr, "Connection accepted");
        Ok((stream, peer_addr))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
