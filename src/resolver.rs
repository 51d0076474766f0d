use std::any::TypeId;
use std::sync::Arc;

use tracing::trace;

use crate::container::ServiceContainer;
use crate::error::ContainerError;
use crate::registration::SharedInstance;
use crate::scope::Scope;

/// The narrow resolution surface consumed by a host framework.
///
/// Absence of a registration is a normal, silent outcome here: unknown
/// services come back as `None` or an empty `Vec`, never as an error. The
/// container's own API stays free of host-framework types; a host plugs in
/// by calling these three operations.
pub trait DependencyResolver: Send + Sync {
    /// Resolves the service registered for `service` under the default
    /// name, or `None` when nothing is registered.
    ///
    /// # Panics
    ///
    /// Absence covers unregistered services only. Any other resolution
    /// failure — a disposed scope, a per-scope service resolved without a
    /// scope, a failing factory — is a configuration or lifecycle bug and
    /// panics, since this interface has no error channel.
    fn get_service(&self, service: TypeId) -> Option<SharedInstance>;

    /// Resolves one instance for every registration of `service`,
    /// regardless of name. Empty when nothing is registered.
    ///
    /// # Panics
    ///
    /// See [`DependencyResolver::get_service`].
    fn get_services(&self, service: TypeId) -> Vec<SharedInstance>;

    /// Opens a new scope and returns a resolver view over it.
    fn begin_scope(&self) -> Box<dyn ScopedResolver>;
}

/// A resolver view over one scope: the same lookup surface plus an explicit
/// release operation. Dropping the resolver also disposes the scope.
pub trait ScopedResolver: DependencyResolver {
    /// Disposes the underlying scope. Safe to call more than once.
    fn dispose(&self);
}

/// Typed convenience over the type-erased [`DependencyResolver`] surface.
pub trait DependencyResolverExt: DependencyResolver {
    fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get_service(TypeId::of::<T>())
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    fn resolve_all<T: Send + Sync + 'static>(&self) -> Vec<Arc<T>> {
        self.get_services(TypeId::of::<T>())
            .into_iter()
            .filter_map(|instance| instance.downcast::<T>().ok())
            .collect()
    }
}

impl<R: DependencyResolver + ?Sized> DependencyResolverExt for R {}

/// Adapter exposing a [`ServiceContainer`] through the
/// [`DependencyResolver`] surface, unscoped.
pub struct ContainerResolver {
    container: ServiceContainer,
}

impl ContainerResolver {
    pub fn new(container: ServiceContainer) -> Self {
        ContainerResolver { container }
    }
}

impl DependencyResolver for ContainerResolver {
    fn get_service(&self, service: TypeId) -> Option<SharedInstance> {
        absent(self.container.resolve_id(service, None))
    }

    fn get_services(&self, service: TypeId) -> Vec<SharedInstance> {
        absent_all(self.container.resolve_all_id(service, None))
    }

    fn begin_scope(&self) -> Box<dyn ScopedResolver> {
        Box::new(ScopeResolver {
            scope: self.container.begin_scope(),
        })
    }
}

/// Adapter exposing one [`Scope`] through the resolver surface.
pub struct ScopeResolver {
    scope: Scope,
}

impl DependencyResolver for ScopeResolver {
    fn get_service(&self, service: TypeId) -> Option<SharedInstance> {
        absent(self.scope.resolve_id(service))
    }

    fn get_services(&self, service: TypeId) -> Vec<SharedInstance> {
        absent_all(self.scope.resolve_all_id(service))
    }

    fn begin_scope(&self) -> Box<dyn ScopedResolver> {
        Box::new(ScopeResolver {
            scope: self.scope.begin_scope(),
        })
    }
}

impl ScopedResolver for ScopeResolver {
    fn dispose(&self) {
        self.scope.dispose();
    }
}

// Absence is reserved for unregistered services. Every other failure is a
// configuration or lifecycle bug and must stay visible; this interface has
// no error channel, so it surfaces as a panic.
fn absent(result: Result<SharedInstance, ContainerError>) -> Option<SharedInstance> {
    match result {
        Ok(instance) => Some(instance),
        Err(err @ ContainerError::UnresolvedService { .. }) => {
            trace!(%err, "resolution produced no instance");
            None
        }
        Err(err) => panic!("service resolution failed: {err}"),
    }
}

fn absent_all(result: Result<Vec<SharedInstance>, ContainerError>) -> Vec<SharedInstance> {
    match result {
        Ok(instances) => instances,
        Err(err @ ContainerError::UnresolvedService { .. }) => {
            trace!(%err, "resolution produced no instances");
            Vec::new()
        }
        Err(err) => panic!("service resolution failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifetime::Lifetime;

    struct Clock;

    #[test]
    fn typed_helpers_downcast() {
        let container = ServiceContainer::new();
        container.register(|_| Ok(Clock), Lifetime::Singleton).unwrap();

        let resolver = ContainerResolver::new(container);
        let clock: Option<Arc<Clock>> = resolver.resolve();
        assert!(clock.is_some());
        assert_eq!(resolver.resolve_all::<Clock>().len(), 1);
    }

    #[test]
    fn unknown_service_is_silent() {
        let resolver = ContainerResolver::new(ServiceContainer::new());
        assert!(resolver.get_service(TypeId::of::<Clock>()).is_none());
        assert!(resolver.get_services(TypeId::of::<Clock>()).is_empty());
    }

    #[test]
    #[should_panic(expected = "has been disposed")]
    fn disposed_scope_resolution_panics() {
        let container = ServiceContainer::new();
        container.register(|_| Ok(Clock), Lifetime::PerScope).unwrap();

        let resolver = ContainerResolver::new(container);
        let scope = resolver.begin_scope();
        scope.dispose();
        scope.get_service(TypeId::of::<Clock>());
    }

    // A registered per-scope service is not "unregistered": resolving it
    // unscoped must not masquerade as absence.
    #[test]
    #[should_panic(expected = "per-scope lifetime and no scope is active")]
    fn per_scope_service_resolved_without_scope_panics() {
        let container = ServiceContainer::new();
        container.register(|_| Ok(Clock), Lifetime::PerScope).unwrap();

        let resolver = ContainerResolver::new(container);
        resolver.get_service(TypeId::of::<Clock>());
    }

    #[test]
    #[should_panic(expected = "per-scope lifetime and no scope is active")]
    fn per_scope_services_listed_without_scope_panic() {
        let container = ServiceContainer::new();
        container.register(|_| Ok(Clock), Lifetime::PerScope).unwrap();

        let resolver = ContainerResolver::new(container);
        resolver.get_services(TypeId::of::<Clock>());
    }
}
