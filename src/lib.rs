//! A generic scoped service container.
//!
//! Registrations pair a `(type, name)` key with a factory and a
//! [`Lifetime`] policy. Resolution happens either directly against the
//! [`ServiceContainer`] or inside a disposable [`Scope`]; per-scope
//! services resolve to one instance per scope. A host framework consumes
//! the container through the narrow [`DependencyResolver`] surface, which
//! reports unknown services as absence rather than as errors.
//!
//! ```rust
//! use scoped_container::{ContainerResolver, DependencyResolver, DependencyResolverExt,
//!     Lifetime, ServiceContainer};
//!
//! struct RequestLog;
//!
//! let container = ServiceContainer::new();
//! container.register(|_| Ok(RequestLog), Lifetime::PerScope).unwrap();
//!
//! let resolver = ContainerResolver::new(container);
//! let scope = resolver.begin_scope();
//! assert!(scope.resolve::<RequestLog>().is_some());
//! scope.dispose();
//! ```

pub mod container;
pub mod error;
pub mod lifetime;
pub mod registration;
pub mod resolver;
pub mod scope;

pub use container::Resolver;
pub use container::ServiceContainer;
pub use error::ContainerError;
pub use lifetime::Lifetime;
pub use registration::ServiceKey;
pub use registration::SharedInstance;
pub use resolver::ContainerResolver;
pub use resolver::DependencyResolver;
pub use resolver::DependencyResolverExt;
pub use resolver::ScopeResolver;
pub use resolver::ScopedResolver;
pub use scope::Scope;
