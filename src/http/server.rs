//! Connection acceptor and server lifecycle.
//!
//! # Responsibilities
//! - Build the handler chain from config at startup
//! - Accept connections and hand each to the bounded worker pool
//! - Per connection: parse, enforce the method allow-list, run the chain
//! - Close every connection on every exit path
//! - Stop accepting on `stop()` and drain in-flight connections

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::{AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, HandlerKind, ServerConfig};
use crate::error::{RequestError, ServerError, StartupError};
use crate::http::chain::{ChainError, HandlerChain, RequestHandler};
use crate::http::request::Request;
use crate::http::response::{Response, ResponseWriter};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionGuard, ConnectionId, ConnectionTracker, Listener, WorkerPool};
use crate::resources::{ResourceCatalog, ResourceHandler};
use crate::routing::{RestHandler, RestRouter, RouteRegistry};

/// Methods accepted at the connection level. Anything else is answered with 405.
pub const ALLOWED_METHODS: &[&str] = &["GET"];

/// Pause after a failed accept so a persistent error does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The HTTP server.
pub struct Server {
    config: Arc<ServerConfig>,
    registry: Arc<RouteRegistry>,
    connections: Arc<ConnectionHandler>,
    pool: WorkerPool,
    tracker: ConnectionTracker,
    shutdown: Shutdown,
    started: AtomicBool,
    local_addr: OnceLock<SocketAddr>,
}

impl Server {
    /// Validate `config` and build the handler chain around `registry`.
    ///
    /// The resource directory is only scanned when the resource handler is
    /// part of the chain.
    pub fn new(config: ServerConfig, registry: RouteRegistry) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let registry = Arc::new(registry);
        let chain = build_chain(&config, &registry)?;

        tracing::info!(
            handlers = ?chain.names(),
            routes = registry.len(),
            max_threads = config.listener.max_threads,
            "Server initialized"
        );

        let shutdown = Shutdown::new();
        let connections = Arc::new(ConnectionHandler {
            chain,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
            write_timeout: Duration::from_secs(config.timeouts.write_secs),
            shutdown: shutdown.clone(),
        });

        Ok(Self {
            pool: WorkerPool::new(config.listener.max_threads),
            config: Arc::new(config),
            registry,
            connections,
            tracker: ConnectionTracker::new(),
            shutdown,
            started: AtomicBool::new(false),
            local_addr: OnceLock::new(),
        })
    }

    /// Bind the configured port and serve until [`stop`](Self::stop).
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.started.load(Ordering::SeqCst) {
            return Err(ServerError::AlreadyStarted);
        }
        let listener = Listener::bind(&self.config.listener).await?;
        self.run(listener).await
    }

    /// Serve on an already bound socket until [`stop`](Self::stop).
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let listener = Listener::from_tcp(listener).map_err(|source| ServerError::Bind {
            address: self.config.listener.socket_address(),
            source,
        })?;
        self.run(listener).await
    }

    /// Stop accepting connections. Safe to call repeatedly and from any task.
    pub fn stop(&self) {
        if self.shutdown.trigger() {
            tracing::info!(
                active_connections = self.tracker.active_count(),
                "Server stop requested"
            );
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Bound address, once serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.connections.chain
    }

    /// Connections accepted and not yet closed, queued ones included.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    async fn run(&self, listener: Listener) -> Result<(), ServerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyStarted);
        }
        let _ = self.local_addr.set(listener.local_addr());
        tracing::info!(address = %listener.local_addr(), "Server accepting connections");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.dispatch(stream, peer_addr),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
        drop(listener);

        let drain = Duration::from_secs(self.config.timeouts.drain_secs);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            drain_secs = drain.as_secs(),
            "Stopped accepting, draining connections"
        );
        if !self.tracker.wait_idle(drain).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timed out, abandoning connections"
            );
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let guard = self.tracker.track();
        tracing::debug!(
            connection_id = %guard.id(),
            peer_addr = %peer_addr,
            queued = self.pool.queued(),
            "Connection accepted"
        );
        let connections = Arc::clone(&self.connections);
        self.pool.submit(async move {
            connections.handle(stream, peer_addr, guard).await;
        });
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr())
            .field("chain", &self.connections.chain)
            .field("routes", &self.registry.paths())
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

fn build_chain(
    config: &ServerConfig,
    registry: &Arc<RouteRegistry>,
) -> Result<HandlerChain, StartupError> {
    let mut handlers: Vec<Arc<dyn RequestHandler>> = Vec::with_capacity(config.chain.handlers.len());
    for kind in &config.chain.handlers {
        match kind {
            HandlerKind::Rest => {
                let router = RestRouter::new(Arc::clone(registry), &config.rest);
                handlers.push(Arc::new(RestHandler::new(router)));
            }
            HandlerKind::Resource => {
                let catalog = ResourceCatalog::scan(config.resources.effective_dir())?;
                handlers.push(Arc::new(ResourceHandler::new(
                    Arc::new(catalog),
                    &config.resources,
                )));
            }
        }
    }
    Ok(HandlerChain::new(handlers))
}

/// Everything a worker needs to serve one connection.
struct ConnectionHandler {
    chain: HandlerChain,
    read_timeout: Duration,
    write_timeout: Duration,
    shutdown: Shutdown,
}

impl ConnectionHandler {
    async fn handle(&self, stream: TcpStream, peer_addr: SocketAddr, guard: ConnectionGuard) {
        let connection_id = guard.id();
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = ResponseWriter::new(write_half).with_timeout(self.write_timeout);

        let parsed = tokio::select! {
            biased;
            parsed = tokio::time::timeout(
                self.read_timeout,
                Request::parse(&mut reader, Some(peer_addr)),
            ) => parsed,
            _ = self.shutdown.wait() => {
                tracing::debug!(connection_id = %connection_id, "Abandoning idle connection on shutdown");
                return;
            }
        };

        match parsed {
            Err(_) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    peer_addr = %peer_addr,
                    timeout_secs = self.read_timeout.as_secs(),
                    "Timed out waiting for request"
                );
            }
            Ok(Err(RequestError::Io(e))) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Failed to read request");
            }
            Ok(Err(RequestError::Malformed(reason))) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    peer_addr = %peer_addr,
                    reason = %reason,
                    "Malformed request"
                );
                write_best_effort(&mut writer, &Response::internal_server_error(), connection_id).await;
            }
            Ok(Ok(request)) => self.exchange(&request, &mut writer, connection_id).await,
        }

        if let Err(e) = writer.shutdown().await {
            tracing::trace!(connection_id = %connection_id, error = %e, "Connection already closed");
        }
    }

    async fn exchange<W>(
        &self,
        request: &Request,
        writer: &mut ResponseWriter<W>,
        connection_id: ConnectionId,
    ) where
        W: AsyncWrite + Unpin,
    {
        tracing::debug!(
            request_id = %request.id(),
            connection_id = %connection_id,
            method = %request.method(),
            path = %request.path(),
            "Request received"
        );

        if !ALLOWED_METHODS.contains(&request.method()) {
            tracing::info!(
                request_id = %request.id(),
                method = %request.method(),
                "Method not allowed"
            );
            write_best_effort(writer, &Response::method_not_allowed(request.method()), connection_id)
                .await;
            return;
        }

        match self.chain.run(request, writer).await {
            Ok(0) => tracing::debug!(request_id = %request.id(), "No handler responded"),
            Ok(_) => {}
            Err(ChainError::Handler { handler, source }) => {
                tracing::error!(
                    request_id = %request.id(),
                    handler,
                    error = %source,
                    "Handler failed"
                );
                if !writer.is_committed() {
                    write_best_effort(writer, &Response::internal_server_error(), connection_id).await;
                }
            }
            Err(ChainError::Io(e)) => {
                tracing::warn!(request_id = %request.id(), error = %e, "Failed to write response");
            }
        }
    }
}

async fn write_best_effort<W>(
    writer: &mut ResponseWriter<W>,
    response: &Response,
    connection_id: ConnectionId,
) where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = writer.write(response).await {
        tracing::warn!(
            connection_id = %connection_id,
            error = %e,
            "Failed to write response, dropping connection"
        );
    }
}
