//! Chain handler for JSON requests.

use crate::http::chain::{HandlerFuture, RequestHandler};
use crate::http::request::Request;
use crate::routing::router::RestRouter;

/// Dispatches requests that accept `application/json` to the [`RestRouter`].
#[derive(Debug, Clone)]
pub struct RestHandler {
    router: RestRouter,
}

impl RestHandler {
    pub fn new(router: RestRouter) -> Self {
        Self { router }
    }
}

impl RequestHandler for RestHandler {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn applies(&self, request: &Request) -> bool {
        request.is_json_request()
    }

    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            tracing::debug!(
                request_id = %request.id(),
                uri = %request.uri(),
                "Handling rest service request"
            );
            Ok(Some(self.router.resolve(request)))
        })
    }
}
