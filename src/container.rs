use std::any::TypeId;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::ContainerError;
use crate::lifetime::Lifetime;
use crate::registration::{Registration, ServiceKey, SharedInstance};
use crate::scope::Scope;

/// Holds service registrations keyed by `(type, name)` and resolves
/// instances according to each registration's [`Lifetime`].
///
/// The container is cheap to clone; clones share the same registration
/// table and singleton cache. Registration and resolution both take
/// `&self`, so a container can be shared across threads freely.
///
/// # Examples
///
/// ```
/// use scoped_container::{Lifetime, ServiceContainer};
///
/// struct Greeter;
///
/// let container = ServiceContainer::new();
/// container.register(|_| Ok(Greeter), Lifetime::PerScope).unwrap();
///
/// let scope = container.begin_scope();
/// let first = scope.get_instance::<Greeter>().unwrap();
/// let second = scope.get_instance::<Greeter>().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
#[derive(Clone)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

#[derive(Default)]
struct ContainerInner {
    registrations: DashMap<ServiceKey, Registration>,
    singletons: DashMap<ServiceKey, SharedInstance>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        ServiceContainer {
            inner: Arc::new(ContainerInner::default()),
        }
    }

    /// Registers a factory for `T` under the default (empty) name.
    ///
    /// The factory receives a [`Resolver`] so it can resolve its own
    /// dependencies from the same container or scope.
    pub fn register<T, F>(&self, factory: F, lifetime: Lifetime) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.register_named("", factory, lifetime)
    }

    /// Registers a factory for `T` under an explicit name. Multiple
    /// registrations of the same type may coexist as long as their names
    /// differ.
    pub fn register_named<T, F>(
        &self,
        name: &str,
        factory: F,
        lifetime: Lifetime,
    ) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.insert(Registration::new(name, factory, lifetime))
    }

    /// Registers a pre-built instance of `T` as a singleton.
    pub fn register_instance<T: Send + Sync + 'static>(
        &self,
        value: T,
    ) -> Result<(), ContainerError> {
        self.register_instance_named("", value)
    }

    /// Registers a pre-built named instance of `T` as a singleton.
    pub fn register_instance_named<T: Send + Sync + 'static>(
        &self,
        name: &str,
        value: T,
    ) -> Result<(), ContainerError> {
        self.insert(Registration::of_instance::<T>(name, Arc::new(value)))
    }

    /// Resolves a single instance of `T` registered under the default name.
    ///
    /// Returns [`ContainerError::UnresolvedService`] when nothing is
    /// registered; the host-facing adapter maps that to `None` instead.
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        self.root_resolver().get_instance()
    }

    /// Resolves a single instance of `T` registered under `name`.
    pub fn get_instance_named<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ContainerError> {
        self.root_resolver().get_instance_named(name)
    }

    /// Resolves one instance for every registration of `T`, regardless of
    /// name. Returns an empty `Vec` when nothing is registered.
    pub fn get_all_instances<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Vec<Arc<T>>, ContainerError> {
        self.root_resolver().get_all_instances()
    }

    /// Opens a new resolution scope bound to this container.
    pub fn begin_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    fn root_resolver(&self) -> Resolver<'_> {
        Resolver {
            container: self,
            scope: None,
        }
    }

    fn insert(&self, registration: Registration) -> Result<(), ContainerError> {
        match self.inner.registrations.entry(registration.key.clone()) {
            Entry::Occupied(_) => Err(ContainerError::DuplicateRegistration {
                service: registration.type_name.to_owned(),
                name: registration.key.name.clone(),
            }),
            Entry::Vacant(slot) => {
                debug!(
                    service = registration.type_name,
                    name = %registration.key.name,
                    lifetime = %registration.lifetime,
                    "service registered"
                );
                slot.insert(registration);
                Ok(())
            }
        }
    }

    pub(crate) fn registration(&self, key: &ServiceKey) -> Option<Registration> {
        self.inner.registrations.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn registrations_of(&self, type_id: TypeId) -> Vec<Registration> {
        self.inner
            .registrations
            .iter()
            .filter(|entry| entry.key().type_id == type_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns the canonical singleton for `registration`, building it on
    /// first use. Under a race the first stored instance wins and any extra
    /// build is discarded, so every caller observes the same instance.
    pub(crate) fn singleton(
        &self,
        registration: &Registration,
        resolver: &Resolver<'_>,
    ) -> Result<SharedInstance, ContainerError> {
        if let Some(existing) = self.inner.singletons.get(&registration.key) {
            return Ok(existing.value().clone());
        }
        let built = (registration.factory)(resolver)?;
        Ok(self
            .inner
            .singletons
            .entry(registration.key.clone())
            .or_insert(built)
            .value()
            .clone())
    }

    pub(crate) fn resolve_id(
        &self,
        type_id: TypeId,
        scope: Option<&Scope>,
    ) -> Result<SharedInstance, ContainerError> {
        Resolver {
            container: self,
            scope,
        }
        .resolve_erased(&ServiceKey::erased(type_id, ""))
    }

    pub(crate) fn resolve_all_id(
        &self,
        type_id: TypeId,
        scope: Option<&Scope>,
    ) -> Result<Vec<SharedInstance>, ContainerError> {
        Resolver {
            container: self,
            scope,
        }
        .resolve_all_erased(type_id)
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// The resolution view handed to factories and used internally by the
/// container and by scopes. When backed by a scope, per-scope instances
/// resolve against that scope's cache.
pub struct Resolver<'a> {
    pub(crate) container: &'a ServiceContainer,
    pub(crate) scope: Option<&'a Scope>,
}

impl Resolver<'_> {
    /// Resolves an instance of `T` registered under the default name.
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        self.get_instance_named("")
    }

    /// Resolves an instance of `T` registered under `name`.
    pub fn get_instance_named<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ContainerError> {
        let key = ServiceKey::of::<T>(name);
        match self.resolve_erased(&key) {
            Ok(instance) => downcast::<T>(instance, name),
            Err(ContainerError::UnresolvedService { name, .. }) => {
                Err(ContainerError::UnresolvedService {
                    service: std::any::type_name::<T>().to_owned(),
                    name,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves one instance for every registration of `T`.
    pub fn get_all_instances<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Vec<Arc<T>>, ContainerError> {
        self.resolve_all_erased(TypeId::of::<T>())?
            .into_iter()
            .map(|instance| downcast::<T>(instance, ""))
            .collect()
    }

    pub(crate) fn resolve_erased(&self, key: &ServiceKey) -> Result<SharedInstance, ContainerError> {
        if let Some(scope) = self.scope {
            scope.ensure_active()?;
        }
        let registration = match self.container.registration(key) {
            Some(registration) => registration,
            None => {
                trace!(?key, "no registration for requested service");
                return Err(ContainerError::UnresolvedService {
                    service: format!("{:?}", key.type_id),
                    name: key.name.clone(),
                });
            }
        };
        self.activate(&registration)
    }

    pub(crate) fn resolve_all_erased(
        &self,
        type_id: TypeId,
    ) -> Result<Vec<SharedInstance>, ContainerError> {
        if let Some(scope) = self.scope {
            scope.ensure_active()?;
        }
        self.container
            .registrations_of(type_id)
            .iter()
            .map(|registration| self.activate(registration))
            .collect()
    }

    fn activate(&self, registration: &Registration) -> Result<SharedInstance, ContainerError> {
        match registration.lifetime {
            Lifetime::Transient => (registration.factory)(self),
            Lifetime::Singleton => self.container.singleton(registration, self),
            Lifetime::PerScope => match self.scope {
                Some(scope) => scope.cached(registration, self),
                None => Err(ContainerError::ScopeRequired {
                    service: registration.type_name.to_owned(),
                }),
            },
        }
    }
}

// Keys carry the TypeId of the registered type, so a mismatch here means a
// corrupted registration table rather than a caller mistake.
fn downcast<T: Send + Sync + 'static>(
    instance: SharedInstance,
    name: &str,
) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::UnresolvedService {
            service: std::any::type_name::<T>().to_owned(),
            name: name.to_owned(),
        })
}
