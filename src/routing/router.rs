//! REST dispatch.
//!
//! # Responsibilities
//! - Resolve a JSON request's path against the route registry
//! - Invoke the matched handler and serialize its result
//! - Map unmapped paths, wrong methods and handler failures to responses
//!
//! # Design Decisions
//! - Handler failures are logged with their cause; the client only sees a
//!   generic message
//! - Unmapped paths and failures answer 200 with a JSON message unless
//!   strict status codes are configured (404 / 500)
//! - A mapped path requested with a method other than its own answers 405

use std::sync::Arc;

use crate::config::RestConfig;
use crate::http::request::Request;
use crate::http::response::{Response, Status};
use crate::routing::registry::{normalize, RouteRegistry};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Looks up and invokes REST routes.
#[derive(Debug, Clone)]
pub struct RestRouter {
    registry: Arc<RouteRegistry>,
    strict_status_codes: bool,
}

impl RestRouter {
    pub fn new(registry: Arc<RouteRegistry>, config: &RestConfig) -> Self {
        Self {
            registry,
            strict_status_codes: config.strict_status_codes,
        }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Produce the JSON response for a request.
    pub fn resolve(&self, request: &Request) -> Response {
        let path = normalize(request.path());

        let route = match self.registry.lookup(path) {
            Some(route) => route,
            None => {
                let message = format!("Invalid endpoint: {}", path);
                tracing::warn!(request_id = %request.id(), path = %path, "No route matched");
                let status = if self.strict_status_codes {
                    Status::NotFound
                } else {
                    Status::Ok
                };
                return Response::json_message(status, &message);
            }
        };

        if request.method() != route.method() {
            tracing::warn!(
                request_id = %request.id(),
                method = %request.method(),
                path = %path,
                "Method not dispatched for route"
            );
            return Response::json_message(
                Status::MethodNotAllowed,
                &format!("Method Not Allowed: {}", request.method()),
            );
        }

        match route.invoke(request) {
            Ok(value) => {
                let body = value.to_string();
                tracing::debug!(
                    request_id = %request.id(),
                    path = %path,
                    handler = route.handler_name(),
                    "Returning json response"
                );
                Response::json(Status::Ok, body)
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request.id(),
                    path = %path,
                    handler = route.handler_name(),
                    error = %e,
                    "Route handler failed"
                );
                let status = if self.strict_status_codes {
                    Status::InternalServerError
                } else {
                    Status::Ok
                };
                Response::json_message(status, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}
