use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::container::{Resolver, ServiceContainer};
use crate::error::ContainerError;
use crate::registration::{Registration, ServiceKey, SharedInstance};

/// A disposable resolution boundary.
///
/// Per-scope services resolve to the same instance for the lifetime of one
/// scope and to a different instance in any other scope. Disposing a scope
/// releases its cached instances; their `Drop` runs once the last
/// outstanding `Arc` is gone. A scope moves from active to disposed exactly
/// once; disposing again is a no-op, and any resolution after disposal
/// fails with [`ContainerError::ScopeDisposed`].
///
/// Dropping a `Scope` disposes it.
pub struct Scope {
    container: ServiceContainer,
    cache: DashMap<ServiceKey, SharedInstance>,
    disposed: AtomicBool,
}

impl Scope {
    pub(crate) fn new(container: ServiceContainer) -> Self {
        debug!("scope opened");
        Scope {
            container,
            cache: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Resolves an instance of `T` registered under the default name,
    /// caching per-scope instances in this scope.
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        self.resolver().get_instance()
    }

    /// Resolves an instance of `T` registered under `name`.
    pub fn get_instance_named<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ContainerError> {
        self.resolver().get_instance_named(name)
    }

    /// Resolves one instance for every registration of `T`, regardless of
    /// name.
    pub fn get_all_instances<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Vec<Arc<T>>, ContainerError> {
        self.resolver().get_all_instances()
    }

    /// Opens a nested scope. The child shares the container's registrations
    /// and singletons but starts with an empty per-scope cache; per-scope
    /// instances are not inherited from the parent.
    pub fn begin_scope(&self) -> Scope {
        Scope::new(self.container.clone())
    }

    /// Releases the scope's cached instances. The first call wins; any
    /// later call is a no-op.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.clear();
        debug!("scope disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            container: &self.container,
            scope: Some(self),
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<(), ContainerError> {
        if self.is_disposed() {
            Err(ContainerError::ScopeDisposed)
        } else {
            Ok(())
        }
    }

    /// Returns this scope's cached instance for `registration`, building it
    /// on first use. Mirrors the singleton cache on the container: under a
    /// race the first stored instance wins.
    pub(crate) fn cached(
        &self,
        registration: &Registration,
        resolver: &Resolver<'_>,
    ) -> Result<SharedInstance, ContainerError> {
        if let Some(existing) = self.cache.get(&registration.key) {
            return Ok(existing.value().clone());
        }
        let built = (registration.factory)(resolver)?;
        Ok(self
            .cache
            .entry(registration.key.clone())
            .or_insert(built)
            .value()
            .clone())
    }

    pub(crate) fn resolve_id(&self, type_id: TypeId) -> Result<SharedInstance, ContainerError> {
        self.container.resolve_id(type_id, Some(self))
    }

    pub(crate) fn resolve_all_id(
        &self,
        type_id: TypeId,
    ) -> Result<Vec<SharedInstance>, ContainerError> {
        self.container.resolve_all_id(type_id, Some(self))
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}
