//! Service instances and their lifetimes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BoxError, StartupError};

/// How instances of a service are provided to its handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceMode {
    /// One instance, constructed at startup and reused by every invocation.
    Shared,
    /// A fresh instance constructed for each invocation.
    #[default]
    PerCall,
}

/// A type whose methods serve REST routes.
pub trait RestService: Sized + Send + Sync + 'static {
    /// Lifetime of instances. Per-call unless overridden.
    fn instance_mode() -> InstanceMode {
        InstanceMode::PerCall
    }

    /// Construct an instance.
    fn create() -> Result<Self, BoxError>;
}

/// Shared service instances, keyed by type. Populated while the registry is
/// built and read-only afterwards.
#[derive(Default)]
pub struct InstanceCache {
    instances: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance of `S`, constructing it on first use.
    pub fn get_or_create<S: RestService>(&mut self) -> Result<Arc<S>, StartupError> {
        if let Some(existing) = self.instances.get(&TypeId::of::<S>()) {
            if let Ok(instance) = Arc::clone(existing).downcast::<S>() {
                return Ok(instance);
            }
        }

        let instance = Arc::new(S::create().map_err(|source| StartupError::InstanceConstruction {
            service: std::any::type_name::<S>(),
            source,
        })?);
        tracing::debug!(
            service = std::any::type_name::<S>(),
            "Shared service instance created"
        );
        self.instances
            .insert(TypeId::of::<S>(), instance.clone() as Arc<dyn Any + Send + Sync>);
        Ok(instance)
    }

    pub fn contains<S: RestService>(&self) -> bool {
        self.instances.contains_key(&TypeId::of::<S>())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("instances", &self.instances.len())
            .finish()
    }
}
