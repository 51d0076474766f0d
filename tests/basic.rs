use std::any::TypeId;
use std::sync::Arc;
use std::thread;

use scoped_container::{
    ContainerResolver, DependencyResolver, DependencyResolverExt, Lifetime, Resolver,
    ServiceContainer,
};

trait Repository: Send + Sync {
    fn backend(&self) -> &'static str;
}

struct SqlRepository;

impl Repository for SqlRepository {
    fn backend(&self) -> &'static str {
        "sql"
    }
}

struct InMemoryRepository;

impl Repository for InMemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

type BoxedRepository = Box<dyn Repository>;

#[test]
fn get_service_known_service_returns_instance() {
    let container = ServiceContainer::new();
    container
        .register(
            |_| Ok(Box::new(SqlRepository) as BoxedRepository),
            Lifetime::Transient,
        )
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let instance = resolver.resolve::<BoxedRepository>().unwrap();
    assert_eq!(instance.backend(), "sql");
}

#[test]
fn get_service_unknown_service_returns_none() {
    let resolver = ContainerResolver::new(ServiceContainer::new());

    assert!(resolver.get_service(TypeId::of::<BoxedRepository>()).is_none());
}

#[test]
fn get_services_multiple_services_returns_all_instances() {
    let container = ServiceContainer::new();
    container
        .register(
            |_| Ok(Box::new(SqlRepository) as BoxedRepository),
            Lifetime::Transient,
        )
        .unwrap();
    container
        .register_named(
            "in-memory",
            |_| Ok(Box::new(InMemoryRepository) as BoxedRepository),
            Lifetime::Transient,
        )
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let instances = resolver.resolve_all::<BoxedRepository>();
    assert_eq!(instances.len(), 2);
}

#[test]
fn get_services_multiple_services_from_scope_returns_all_instances() {
    let container = ServiceContainer::new();
    container
        .register(
            |_| Ok(Box::new(SqlRepository) as BoxedRepository),
            Lifetime::PerScope,
        )
        .unwrap();
    container
        .register_named(
            "in-memory",
            |_| Ok(Box::new(InMemoryRepository) as BoxedRepository),
            Lifetime::PerScope,
        )
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let scope = resolver.begin_scope();
    let instances = scope.resolve_all::<BoxedRepository>();
    assert_eq!(instances.len(), 2);

    // An independent scope sees the same registrations but fresh instances.
    let other = resolver.begin_scope();
    let other_instances = other.resolve_all::<BoxedRepository>();
    assert_eq!(other_instances.len(), 2);
    for instance in &instances {
        for other_instance in &other_instances {
            assert!(!Arc::ptr_eq(instance, other_instance));
        }
    }

    other.dispose();
    scope.dispose();
}

#[test]
fn get_services_unknown_service_returns_empty() {
    let container = ServiceContainer::new();
    container.register(|_| Ok(42u32), Lifetime::Transient).unwrap();
    let resolver = ContainerResolver::new(container);

    assert!(resolver.get_services(TypeId::of::<BoxedRepository>()).is_empty());
}

#[test]
fn scoped_resolutions_are_stable_within_and_distinct_across_scopes() {
    let container = ServiceContainer::new();
    container
        .register(
            |_| Ok(Box::new(SqlRepository) as BoxedRepository),
            Lifetime::PerScope,
        )
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let first_scope = resolver.begin_scope();
    let second_scope = resolver.begin_scope();

    let a = first_scope.resolve::<BoxedRepository>().unwrap();
    let b = first_scope.resolve::<BoxedRepository>().unwrap();
    let c = second_scope.resolve::<BoxedRepository>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn registered_instance_is_visible_through_the_resolver() {
    let container = ServiceContainer::new();
    container
        .register_instance(vec!["SomeValue".to_owned()])
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let values = resolver.resolve::<Vec<String>>().unwrap();
    assert_eq!(values[0], "SomeValue");
}

// A factory may itself be built from another registered factory; the
// container wires the dependency transitively.
#[test]
fn factory_depending_on_registered_factory_resolves_transitively() {
    struct RepositoryFactory {
        backend: &'static str,
    }

    impl RepositoryFactory {
        fn create(&self) -> BoxedRepository {
            match self.backend {
                "memory" => Box::new(InMemoryRepository),
                _ => Box::new(SqlRepository),
            }
        }
    }

    let container = ServiceContainer::new();
    container
        .register(|_| Ok(RepositoryFactory { backend: "memory" }), Lifetime::Singleton)
        .unwrap();
    container
        .register(
            |resolver: &Resolver<'_>| {
                let factory = resolver.get_instance::<RepositoryFactory>()?;
                Ok(factory.create())
            },
            Lifetime::Transient,
        )
        .unwrap();
    let resolver = ContainerResolver::new(container);

    let instance = resolver.resolve::<BoxedRepository>().unwrap();
    assert_eq!(instance.backend(), "memory");
}

// Ten threads, each with its own scope: no errors, instances stable
// within a scope and pairwise distinct across threads. Results come back
// over a channel rather than through shared mutable state.
#[test]
fn get_service_multiple_threads_keeps_scopes_independent() {
    struct Connection;

    let container = ServiceContainer::new();
    container.register(|_| Ok(Connection), Lifetime::PerScope).unwrap();
    let resolver = Arc::new(ContainerResolver::new(container));

    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut handles = Vec::new();
    for _ in 0..10 {
        let resolver = resolver.clone();
        let sender = sender.clone();
        handles.push(thread::spawn(move || {
            let scope = resolver.begin_scope();
            let first = scope.resolve::<Connection>().expect("registered service");
            let second = scope.resolve::<Connection>().expect("registered service");
            assert!(Arc::ptr_eq(&first, &second));
            sender.send(first).expect("collector alive");
            scope.dispose();
        }));
    }
    drop(sender);

    for handle in handles {
        handle.join().expect("no panic in resolving thread");
    }

    let instances: Vec<Arc<Connection>> = receiver.iter().collect();
    assert_eq!(instances.len(), 10);
    for (index, instance) in instances.iter().enumerate() {
        for other in &instances[index + 1..] {
            assert!(!Arc::ptr_eq(instance, other));
        }
    }
}
