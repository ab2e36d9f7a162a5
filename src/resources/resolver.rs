//! Static resource lookup.

use std::sync::Arc;

use crate::config::ResourceConfig;
use crate::http::request::Request;
use crate::resources::catalog::ResourceCatalog;

/// Maps a request path to a resource name, falling back to a default
/// resource for shallow paths.
#[derive(Debug, Clone)]
pub struct StaticResourceResolver {
    catalog: Arc<ResourceCatalog>,
    max_path_level: usize,
    default_resource: String,
}

impl StaticResourceResolver {
    pub fn new(catalog: Arc<ResourceCatalog>, config: &ResourceConfig) -> Self {
        Self {
            catalog,
            max_path_level: config.max_path_level,
            default_resource: format!("/{}", config.default_page.trim().trim_start_matches('/')),
        }
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn default_resource(&self) -> &str {
        &self.default_resource
    }

    /// Resolve with the configured depth limit and default resource.
    pub fn resolve(&self, request: &Request) -> Option<&str> {
        self.lookup(request, self.max_path_level, &self.default_resource)
    }

    /// Paths deeper than `max_path_level` must match exactly; shallower
    /// ones fall back to `default_resource`.
    pub fn lookup<'a>(
        &'a self,
        request: &Request,
        max_path_level: usize,
        default_resource: &'a str,
    ) -> Option<&'a str> {
        let exact = self.catalog.name(request.path());
        if request.path_level() > max_path_level {
            exact
        } else {
            exact.or(Some(default_resource))
        }
    }
}
