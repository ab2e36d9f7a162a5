//! Built-in `/status` endpoint.

use std::convert::Infallible;
use std::time::Instant;

use serde::Serialize;

use crate::error::BoxError;
use crate::routing::{InstanceMode, RestService, RouteRegistryBuilder};

/// Path of the status route.
pub const STATUS_PATH: &str = "/status";

/// Body of the status route.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// Reports the server version and uptime. One instance per process, so
/// uptime counts from registry construction.
#[derive(Debug)]
pub struct StatusService {
    started_at: Instant,
}

impl RestService for StatusService {
    fn instance_mode() -> InstanceMode {
        InstanceMode::Shared
    }

    fn create() -> Result<Self, BoxError> {
        Ok(Self {
            started_at: Instant::now(),
        })
    }
}

impl StatusService {
    pub fn status(&self) -> Result<SystemStatus, Infallible> {
        Ok(SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            uptime_secs: self.started_at.elapsed().as_secs(),
        })
    }
}

/// Add the status route to `builder`.
pub fn register(builder: RouteRegistryBuilder) -> RouteRegistryBuilder {
    builder.get(STATUS_PATH, StatusService::status)
}
