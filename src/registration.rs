use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::Resolver;
use crate::error::ContainerError;
use crate::lifetime::Lifetime;

/// A resolved instance as handed out by the container.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFn =
    Arc<dyn Fn(&Resolver<'_>) -> Result<SharedInstance, ContainerError> + Send + Sync>;

/// Identity of a registration: the requested type plus an optional name.
///
/// The default name is the empty string. The container holds at most one
/// active registration per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub(crate) type_id: TypeId,
    pub(crate) name: String,
}

impl ServiceKey {
    pub fn of<T: 'static>(name: &str) -> Self {
        ServiceKey {
            type_id: TypeId::of::<T>(),
            name: name.to_owned(),
        }
    }

    pub(crate) fn erased(type_id: TypeId, name: &str) -> Self {
        ServiceKey {
            type_id,
            name: name.to_owned(),
        }
    }
}

/// A stored association from a service key to a construction strategy
/// and a lifetime.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) key: ServiceKey,
    pub(crate) type_name: &'static str,
    pub(crate) factory: FactoryFn,
    pub(crate) lifetime: Lifetime,
}

impl Registration {
    pub(crate) fn new<T, F>(name: &str, factory: F, lifetime: Lifetime) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        let erased: FactoryFn = Arc::new(move |resolver| {
            factory(resolver).map(|value| Arc::new(value) as SharedInstance)
        });
        Registration {
            key: ServiceKey::of::<T>(name),
            type_name: std::any::type_name::<T>(),
            factory: erased,
            lifetime,
        }
    }

    /// A registration backed by a pre-built instance. The factory always
    /// returns the same instance, so it behaves as a singleton even before
    /// the singleton cache sees it.
    pub(crate) fn of_instance<T: Send + Sync + 'static>(name: &str, instance: SharedInstance) -> Self {
        let erased: FactoryFn = Arc::new(move |_| Ok(instance.clone()));
        Registration {
            key: ServiceKey::of::<T>(name),
            type_name: std::any::type_name::<T>(),
            factory: erased,
            lifetime: Lifetime::Singleton,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("service", &format_args!("{}", self.type_name))
            .field("name", &self.key.name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
