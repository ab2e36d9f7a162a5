//! Chain handler for static resources.

use std::sync::Arc;

use crate::config::ResourceConfig;
use crate::error::HandlerError;
use crate::http::chain::{HandlerFuture, RequestHandler};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::resources::catalog::ResourceCatalog;
use crate::resources::mime::mime_type;
use crate::resources::resolver::StaticResourceResolver;

/// Serves files from the resource catalog to non-JSON requests.
#[derive(Debug, Clone)]
pub struct ResourceHandler {
    resolver: StaticResourceResolver,
    cache_max_age: i64,
}

impl ResourceHandler {
    pub fn new(catalog: Arc<ResourceCatalog>, config: &ResourceConfig) -> Self {
        Self {
            resolver: StaticResourceResolver::new(catalog, config),
            cache_max_age: config.cache_max_age,
        }
    }

    pub fn resolver(&self) -> &StaticResourceResolver {
        &self.resolver
    }

    async fn respond(&self, request: &Request) -> Result<Response, HandlerError> {
        let Some(name) = self.resolver.resolve(request) else {
            tracing::debug!(request_id = %request.id(), path = %request.path(), "No resource matched");
            return Ok(Response::resource_not_found(request.path()));
        };

        let catalog = self.resolver.catalog();
        match catalog.read(name).await {
            Ok(Some(bytes)) => {
                tracing::debug!(
                    request_id = %request.id(),
                    resource = %name,
                    bytes = bytes.len(),
                    "Serving resource"
                );
                Ok(Response::resource(bytes, mime_type(name), self.cache_max_age))
            }
            Ok(None) => Ok(Response::resource_not_found(request.path())),
            Err(source) => Err(HandlerError::Resource {
                path: catalog
                    .get(name)
                    .map(|path| path.to_path_buf())
                    .unwrap_or_else(|| catalog.root().join(name.trim_start_matches('/'))),
                source,
            }),
        }
    }
}

impl RequestHandler for ResourceHandler {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn applies(&self, request: &Request) -> bool {
        !request.is_json_request()
    }

    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move { self.respond(request).await.map(Some) })
    }
}
