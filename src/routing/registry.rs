//! Route registration and lookup.
//!
//! # Responsibilities
//! - Collect (path, handler, instance mode) descriptors from the application
//! - Reject duplicate paths before the server starts
//! - Construct shared service instances exactly once
//! - Look up and invoke the handler for a path
//!
//! # Design Decisions
//! - Built once, immutable afterwards (thread-safe without locks)
//! - Exact-string path match after trimming
//! - A duplicate path is fatal, never logged-and-skipped
//! - Per-call construction failures surface as invocation errors
//! - A panicking handler is caught and reported like a failed one

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxError, HandlerError, StartupError};
use crate::http::request::Request;
use crate::routing::instances::{InstanceCache, InstanceMode, RestService};

/// Erased handler: request in, JSON value out.
type Invoker = Arc<dyn Fn(&Request) -> Result<Value, HandlerError> + Send + Sync>;

/// Deferred binding of a handler to its service instance.
type Binder = Box<dyn FnOnce(&mut InstanceCache) -> Result<Invoker, StartupError> + Send>;

/// Methods a route can be registered for.
pub const ROUTE_METHOD: &str = "GET";

/// A registered route.
#[derive(Clone)]
pub struct Route {
    path: String,
    handler_name: &'static str,
    service: &'static str,
    mode: InstanceMode,
    invoker: Invoker,
}

impl Route {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fully qualified name of the handler function.
    pub fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    /// Fully qualified name of the service type.
    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn instance_mode(&self) -> InstanceMode {
        self.mode
    }

    /// Method the route is dispatched for.
    pub fn method(&self) -> &'static str {
        ROUTE_METHOD
    }

    /// Run the handler and convert its result to JSON.
    pub fn invoke(&self, request: &Request) -> Result<Value, HandlerError> {
        (self.invoker)(request)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("handler", &self.handler_name)
            .field("mode", &self.mode)
            .finish()
    }
}

struct RouteDescriptor {
    path: String,
    handler_name: &'static str,
    service: &'static str,
    mode: InstanceMode,
    binder: Binder,
}

/// Collects route descriptors; `build` validates and freezes them.
#[derive(Default)]
pub struct RouteRegistryBuilder {
    descriptors: Vec<RouteDescriptor>,
}

impl RouteRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that needs only its service instance.
    pub fn get<S, F, R, E>(self, path: &str, handler: F) -> Self
    where
        S: RestService,
        F: Fn(&S) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize,
        E: Into<BoxError>,
    {
        let handler_name = std::any::type_name::<F>();
        self.get_with_request::<S, _, R, E>(path, handler_name, move |service, _| handler(service))
    }

    /// Register a handler that also receives the request.
    pub fn get_with_request<S, F, R, E>(
        mut self,
        path: &str,
        handler_name: &'static str,
        handler: F,
    ) -> Self
    where
        S: RestService,
        F: Fn(&S, &Request) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize,
        E: Into<BoxError>,
    {
        let path = path.trim().to_string();
        let route = path.clone();
        let mode = S::instance_mode();

        let binder: Binder = Box::new(move |cache: &mut InstanceCache| -> Result<Invoker, StartupError> {
            let invoker: Invoker = match mode {
                InstanceMode::Shared => {
                    let instance = cache.get_or_create::<S>()?;
                    let shared: Invoker = Arc::new(move |request: &Request| -> Result<Value, HandlerError> {
                        let result = guarded(&route, || handler(&*instance, request).map_err(Into::into))?;
                        to_json(&route, result)
                    });
                    shared
                }
                InstanceMode::PerCall => {
                    let per_call: Invoker = Arc::new(move |request: &Request| -> Result<Value, HandlerError> {
                        let result = guarded(&route, || {
                            let instance = S::create()?;
                            handler(&instance, request).map_err(Into::into)
                        })?;
                        to_json(&route, result)
                    });
                    per_call
                }
            };
            Ok(invoker)
        });

        self.descriptors.push(RouteDescriptor {
            path,
            handler_name,
            service: std::any::type_name::<S>(),
            mode,
            binder,
        });
        self
    }

    /// Validate descriptors, construct shared instances and freeze the table.
    pub fn build(self) -> Result<RouteRegistry, StartupError> {
        let mut routes: HashMap<String, Route> = HashMap::with_capacity(self.descriptors.len());
        let mut instances = InstanceCache::new();

        for descriptor in self.descriptors {
            if let Some(existing) = routes.get(&descriptor.path) {
                let err = StartupError::DuplicateRoute {
                    path: descriptor.path.clone(),
                    existing: existing.handler_name.to_string(),
                    duplicate: descriptor.handler_name.to_string(),
                };
                tracing::error!(error = %err, "Route registration failed");
                return Err(err);
            }

            let invoker = (descriptor.binder)(&mut instances)?;
            tracing::debug!(
                path = %descriptor.path,
                handler = descriptor.handler_name,
                mode = ?descriptor.mode,
                "Route registered"
            );
            routes.insert(
                descriptor.path.clone(),
                Route {
                    path: descriptor.path,
                    handler_name: descriptor.handler_name,
                    service: descriptor.service,
                    mode: descriptor.mode,
                    invoker,
                },
            );
        }

        tracing::info!(
            routes = routes.len(),
            shared_instances = instances.len(),
            "Route registry built"
        );
        Ok(RouteRegistry { routes, instances })
    }
}

/// Run application code for `route`, turning both errors and panics into
/// invocation failures.
fn guarded<R>(route: &str, call: impl FnOnce() -> Result<R, BoxError>) -> Result<R, HandlerError> {
    let source = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(result)) => return Ok(result),
        Ok(Err(source)) => source,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(route = %route, panic = %message, "Route handler panicked");
            format!("handler panicked: {}", message).into()
        }
    };
    Err(HandlerError::Invocation {
        route: route.to_string(),
        source,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

fn to_json<R: Serialize>(route: &str, result: R) -> Result<Value, HandlerError> {
    serde_json::to_value(result).map_err(|source| HandlerError::Serialization {
        route: route.to_string(),
        source,
    })
}

/// Immutable path → route table.
#[derive(Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Route>,
    instances: InstanceCache,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::new()
    }

    /// A registry with no routes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a route. Blank paths resolve as "/".
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.get(normalize(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Number of shared service instances held.
    pub fn shared_instances(&self) -> usize {
        self.instances.len()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("paths", &self.paths())
            .field("instances", &self.instances)
            .finish()
    }
}

/// Trim a lookup path; blank becomes "/".
pub fn normalize(path: &str) -> &str {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
