use parking_lot::ReentrantMutex;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use tracing::{debug, debug_span, error, info_span, warn};

use crate::{
    any::{RcAny, TypeInfo},
    cache::InstanceCache,
    config::Lifetime,
    descriptor::ComponentDescriptor,
    errors::ResolveErrorKind,
    identifier::ComponentIdentifier,
    module::Module,
    tag::Tag,
};

/// Resolution engine over a fixed set of descriptors.
///
/// Cloning is cheap and every clone shares the same descriptors and instances.
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    descriptors: HashMap<ComponentIdentifier, ComponentDescriptor>,
    eager: Vec<ComponentDescriptor>,
    // Re-entrant so construction closures can resolve other singletons from the same thread.
    // The `RefCell` is never borrowed across a construction call.
    cache: ReentrantMutex<RefCell<InstanceCache>>,
    // Number of leading `eager` descriptors already constructed
    eager_instantiated: ReentrantMutex<Cell<usize>>,
}

impl Registry {
    /// Creates registry with the descriptors of the module as its fixed descriptor table.
    ///
    /// # Notes
    /// Components created at start aren't instantiated here.
    /// This happens on [`crate::root::define`] or on an explicit [`Self::instantiate_eager`] call.
    #[must_use]
    pub fn new(module: Module) -> Self {
        let descriptors = module.into_descriptors();
        let eager = descriptors
            .iter()
            .filter(|descriptor| descriptor.is_created_at_start())
            .cloned()
            .collect();
        let descriptors = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.identifier().clone(), descriptor))
            .collect::<HashMap<_, _>>();

        debug!(components = descriptors.len(), "Registry created");

        Self {
            inner: Arc::new(RegistryInner {
                descriptors,
                eager,
                cache: ReentrantMutex::new(RefCell::new(InstanceCache::new())),
                eager_instantiated: ReentrantMutex::new(Cell::new(0)),
            }),
        }
    }

    /// Gets an untagged component
    ///
    /// # Notes
    /// A singleton is constructed on first call and shared afterwards,
    /// a factory is constructed anew on every call.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn get<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_by_identifier(ComponentIdentifier::of::<Dep>())
    }

    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn get_tagged<Dep: Send + Sync + 'static>(&self, tag: impl Into<Tag>) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_by_identifier(ComponentIdentifier::of_tagged::<Dep>(tag))
    }

    /// Gets a component by its identifier and casts it to `Dep`
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoComponent`] if nothing is registered for the identifier
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the identifier names a type other than `Dep`
    /// - Returns [`ResolveErrorKind::Dependency`] if an argument of the construction closure can't be resolved
    pub fn get_by_identifier<Dep: Send + Sync + 'static>(&self, identifier: ComponentIdentifier) -> Result<Arc<Dep>, ResolveErrorKind> {
        let span = info_span!("get", component = identifier.type_info.short_name(), tag = ?identifier.tag);
        let _guard = span.enter();

        let instance = match self.get_erased(&identifier) {
            Ok(instance) => instance,
            Err(err @ ResolveErrorKind::NoComponent { .. }) => {
                warn!("{}", err);
                return Err(err);
            }
            Err(err) => {
                error!("{}", err);
                return Err(err);
            }
        };

        match instance.downcast::<Dep>() {
            Ok(dependency) => Ok(dependency),
            Err(incorrect_type) => {
                let err = ResolveErrorKind::IncorrectType {
                    identifier,
                    expected: TypeInfo::of::<Dep>(),
                    actual: (*incorrect_type).type_id(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves an untagged component.
    ///
    /// # Panics
    /// Panics if the component can't be resolved.
    /// The set of components is fixed when the registry is created, so this is always a wiring mistake.
    #[must_use]
    #[track_caller]
    pub fn resolve<Dep: Send + Sync + 'static>(&self) -> Arc<Dep> {
        self.resolve_identifier(ComponentIdentifier::of::<Dep>())
    }

    /// # Panics
    /// Panics if the component can't be resolved, see [`Self::resolve`]
    #[must_use]
    #[track_caller]
    pub fn resolve_tagged<Dep: Send + Sync + 'static>(&self, tag: impl Into<Tag>) -> Arc<Dep> {
        self.resolve_identifier(ComponentIdentifier::of_tagged::<Dep>(tag))
    }

    /// # Panics
    /// Panics if the component can't be resolved, see [`Self::resolve`]
    #[must_use]
    #[track_caller]
    pub fn resolve_identifier<Dep: Send + Sync + 'static>(&self, identifier: ComponentIdentifier) -> Arc<Dep> {
        match self.get_by_identifier(identifier) {
            Ok(dependency) => dependency,
            Err(err) => fatal(&err),
        }
    }

    /// Resolves an untagged component, returning `None` instead of failing
    #[must_use]
    pub fn try_resolve<Dep: Send + Sync + 'static>(&self) -> Option<Arc<Dep>> {
        self.try_resolve_identifier(ComponentIdentifier::of::<Dep>())
    }

    #[must_use]
    pub fn try_resolve_tagged<Dep: Send + Sync + 'static>(&self, tag: impl Into<Tag>) -> Option<Arc<Dep>> {
        self.try_resolve_identifier(ComponentIdentifier::of_tagged::<Dep>(tag))
    }

    #[must_use]
    pub fn try_resolve_identifier<Dep: Send + Sync + 'static>(&self, identifier: ComponentIdentifier) -> Option<Arc<Dep>> {
        if !self.contains(&identifier) {
            debug!(%identifier, "Not registered");
            return None;
        }
        self.get_by_identifier(identifier).ok()
    }

    /// Checks whether an untagged component is registered.
    /// Only the descriptor table is consulted: nothing is constructed and no lock is taken.
    #[inline]
    #[must_use]
    pub fn resolvable<Dep: ?Sized + 'static>(&self) -> bool {
        self.contains(&ComponentIdentifier::of::<Dep>())
    }

    #[inline]
    #[must_use]
    pub fn resolvable_tagged<Dep: ?Sized + 'static>(&self, tag: impl Into<Tag>) -> bool {
        self.contains(&ComponentIdentifier::of_tagged::<Dep>(tag))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, identifier: &ComponentIdentifier) -> bool {
        self.inner.descriptors.contains_key(identifier)
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self, identifier: &ComponentIdentifier) -> Option<&ComponentDescriptor> {
        self.inner.descriptors.get(identifier)
    }

    #[inline]
    pub fn identifiers(&self) -> impl Iterator<Item = &ComponentIdentifier> {
        self.inner.descriptors.keys()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.descriptors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.descriptors.is_empty()
    }

    /// Checks whether a singleton instance is already cached for the identifier
    #[must_use]
    pub fn is_cached(&self, identifier: &ComponentIdentifier) -> bool {
        let guard = self.inner.cache.lock();
        let cached = guard.borrow().contains(identifier);
        cached
    }

    /// Constructs every component flagged as created at start, in registration order.
    ///
    /// Singletons are cached as if they were resolved.
    /// Factories get a single warmed instance that lives as long as the registry,
    /// and keep producing fresh instances on resolution.
    ///
    /// # Notes
    /// Each component is constructed at most once by this call, however often it's made.
    /// After a successful call later calls return `Ok(())` right away.
    /// After a failure, a later call skips the components already constructed
    /// and retries starting from the one that failed.
    ///
    /// # Errors
    /// Returns the error of the first component that can't be constructed.
    pub fn instantiate_eager(&self) -> Result<(), ResolveErrorKind> {
        let guard = self.inner.eager_instantiated.lock();
        let instantiated = guard.get();
        if instantiated == self.inner.eager.len() {
            debug!("Components created at start are already instantiated");
            return Ok(());
        }

        for descriptor in &self.inner.eager[instantiated..] {
            let identifier = descriptor.identifier();
            let span = debug_span!("instantiate_eager", component = identifier.type_info.short_name(), tag = ?identifier.tag);
            let _guard = span.enter();

            let result = match descriptor.lifetime() {
                Lifetime::Singleton => self.get_singleton(descriptor).map(drop),
                Lifetime::Factory => descriptor.instantiate(self).map(|instance| {
                    let guard = self.inner.cache.lock();
                    guard.borrow_mut().push_warmed(instance);
                    debug!("Warmed");
                }),
            };
            if let Err(err) = result {
                error!("{}", err);
                return Err(err);
            }
            guard.set(guard.get() + 1);
        }

        Ok(())
    }
}

impl Registry {
    pub(crate) fn get_erased(&self, identifier: &ComponentIdentifier) -> Result<RcAny, ResolveErrorKind> {
        let Some(descriptor) = self.inner.descriptors.get(identifier) else {
            return Err(ResolveErrorKind::NoComponent {
                identifier: identifier.clone(),
            });
        };

        match descriptor.lifetime() {
            Lifetime::Factory => {
                let instance = descriptor.instantiate(self)?;
                debug!("Instantiated new factory instance");
                Ok(instance)
            }
            Lifetime::Singleton => self.get_singleton(descriptor),
        }
    }

    fn get_singleton(&self, descriptor: &ComponentDescriptor) -> Result<RcAny, ResolveErrorKind> {
        let identifier = descriptor.identifier();

        // Cache check, construction and insertion happen under one guard,
        // so racing threads construct a singleton at most once.
        let guard = self.inner.cache.lock();

        let cached = guard.borrow().get(identifier);
        if let Some(instance) = cached {
            debug!("Found in cache");
            return Ok(instance);
        }
        debug!("Not found in cache");

        let instance = descriptor.instantiate(self)?;
        let instance = guard.borrow_mut().insert_if_absent(identifier.clone(), instance);
        debug!("Cached");

        Ok(instance)
    }
}

impl From<Module> for Registry {
    #[inline]
    fn from(module: Module) -> Self {
        Self::new(module)
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let guard = self.inner.cache.lock();
        let (cached, warmed) = {
            let cache = guard.borrow();
            (cache.len(), cache.warmed_len())
        };

        f.debug_struct("Registry")
            .field("components", &self.inner.descriptors.len())
            .field("cached", &cached)
            .field("warmed", &warmed)
            .field("eager_instantiated", &self.inner.eager_instantiated.lock().get())
            .finish_non_exhaustive()
    }
}

#[track_caller]
pub(crate) fn fatal(err: &ResolveErrorKind) -> ! {
    error!("{}", err);
    match err {
        ResolveErrorKind::Dependency { .. } => panic!("{err}: {}", err.root_cause()),
        _ => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{inject::Inject, instance, ComponentIdentifier, Config, Module, ResolveErrorKind, Tag};

    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
        time::Duration,
    };
    use tracing::debug;
    use tracing_test::traced_test;

    struct A;
    struct B(Arc<A>);
    struct C(Arc<B>, Arc<A>);
    struct Unregistered;

    fn counted<T: 'static>(call_count: &Arc<AtomicUsize>, value: fn() -> T) -> impl Fn() -> T + Clone + Send + Sync + 'static {
        let call_count = call_count.clone();
        move || {
            call_count.fetch_add(1, Ordering::SeqCst);
            value()
        }
    }

    #[test]
    #[traced_test]
    fn test_singleton_get() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(Module::new().single(counted(&call_count, || A)));

        let a_1 = registry.get::<A>().unwrap();
        let a_2 = registry.get::<A>().unwrap();
        let a_3 = registry.resolve::<A>();

        assert!(Arc::ptr_eq(&a_1, &a_2));
        assert!(Arc::ptr_eq(&a_1, &a_3));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Found in cache"));
        assert!(logs_contain("component=\"A\""));
    }

    #[test]
    #[traced_test]
    fn test_factory_get() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(Module::new().factory(counted(&call_count, || A)));

        let a_1 = registry.get::<A>().unwrap();
        let a_2 = registry.get::<A>().unwrap();
        let a_3 = registry.resolve::<A>();

        assert!(!Arc::ptr_eq(&a_1, &a_2));
        assert!(!Arc::ptr_eq(&a_2, &a_3));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(!registry.is_cached(&ComponentIdentifier::of::<A>()));
    }

    #[test]
    #[traced_test]
    fn test_tagged_get() {
        let registry = Registry::new(Module::new().single(|| A).single_tagged("t", || A).factory_tagged(Tag::new(7u8), || A));

        let untagged = registry.resolve::<A>();
        let tagged = registry.resolve_tagged::<A>("t");
        let tagged_owned = registry.resolve_tagged::<A>(String::from("t"));

        assert!(!Arc::ptr_eq(&untagged, &tagged));
        assert!(Arc::ptr_eq(&tagged, &tagged_owned));
        assert!(registry.get_tagged::<A>(Tag::new(7u8)).is_ok());
        assert!(matches!(registry.get_tagged::<A>("u"), Err(ResolveErrorKind::NoComponent { .. })));
    }

    #[test]
    #[traced_test]
    fn test_get_with_dependencies() {
        let registry = Registry::new(
            Module::new()
                .single(|Inject(b): Inject<B>, Inject(a): Inject<A>| C(b, a))
                .factory(|Inject(a): Inject<A>| B(a))
                .single(|| A),
        );

        let c_1 = registry.resolve::<C>();
        let c_2 = registry.resolve::<C>();
        let b = registry.resolve::<B>();

        assert!(Arc::ptr_eq(&c_1, &c_2));
        assert!(Arc::ptr_eq(&c_1.0 .0, &c_1.1));
        assert!(Arc::ptr_eq(&b.0, &c_1.1));
        assert!(!Arc::ptr_eq(&b, &c_1.0));
    }

    #[test]
    #[traced_test]
    fn test_get_with_tagged_dependency() {
        let registry = Registry::new(
            Module::new()
                .single_tagged("replica", || A)
                .single(|registry: Registry| B(registry.resolve_tagged("replica"))),
        );

        let b = registry.resolve::<B>();

        assert!(Arc::ptr_eq(&b.0, &registry.resolve_tagged::<A>("replica")));
        assert!(!registry.resolvable::<A>());
    }

    #[test]
    #[traced_test]
    fn test_not_registered() {
        let registry = Registry::new(Module::new().single(|| A));

        assert!(!registry.resolvable::<Unregistered>());
        assert!(!registry.resolvable_tagged::<A>("t"));
        assert!(registry.try_resolve::<Unregistered>().is_none());
        assert!(registry.try_resolve_tagged::<A>("t").is_none());
        assert!(matches!(
            registry.get::<Unregistered>(),
            Err(ResolveErrorKind::NoComponent { identifier }) if identifier == ComponentIdentifier::of::<Unregistered>()
        ));
        assert!(!registry.is_cached(&ComponentIdentifier::of::<A>()));
    }

    #[test]
    #[traced_test]
    fn test_resolvable_does_not_construct() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(Module::new().single(counted(&call_count, || A)));

        assert!(registry.resolvable::<A>());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
        assert!(!registry.is_cached(&ComponentIdentifier::of::<A>()));
    }

    #[test]
    #[traced_test]
    #[should_panic(expected = "could not be resolved")]
    fn test_resolve_not_registered_panics() {
        let registry = Registry::new(Module::new());

        let _ = registry.resolve::<Unregistered>();
    }

    #[test]
    #[traced_test]
    #[should_panic(expected = "no registration found")]
    fn test_resolve_missing_dependency_panics() {
        let registry = Registry::new(Module::new().single(|Inject(a): Inject<A>| B(a)));

        let _ = registry.resolve::<B>();
    }

    #[test]
    #[traced_test]
    fn test_try_resolve_missing_dependency() {
        let registry = Registry::new(Module::new().single(|Inject(a): Inject<A>| B(a)));

        assert!(registry.resolvable::<B>());
        assert!(registry.try_resolve::<B>().is_none());
        assert!(matches!(registry.get::<B>(), Err(ResolveErrorKind::Dependency { .. })));
    }

    #[test]
    #[traced_test]
    fn test_incorrect_type() {
        let registry = Registry::new(Module::new().single(|| A));

        let err = registry.get_by_identifier::<B>(ComponentIdentifier::of::<A>()).err().unwrap();

        assert!(matches!(err, ResolveErrorKind::IncorrectType { .. }));
    }

    #[test]
    #[traced_test]
    fn test_instantiate_eager() {
        let singleton_call_count = Arc::new(AtomicUsize::new(0));
        let factory_call_count = Arc::new(AtomicUsize::new(0));
        let lazy_call_count = Arc::new(AtomicUsize::new(0));

        let registry = Registry::new(
            Module::new()
                .provide(counted(&singleton_call_count, || A), Config::single().created_at_start(true))
                .provide(counted(&factory_call_count, || B(Arc::new(A))), Config::factory().created_at_start(true))
                .single_tagged("lazy", counted(&lazy_call_count, || A)),
        );
        assert_eq!(singleton_call_count.load(Ordering::SeqCst), 0);

        registry.instantiate_eager().unwrap();

        assert_eq!(singleton_call_count.load(Ordering::SeqCst), 1);
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 1);
        assert_eq!(lazy_call_count.load(Ordering::SeqCst), 0);
        assert!(registry.is_cached(&ComponentIdentifier::of::<A>()));
        assert!(!registry.is_cached(&ComponentIdentifier::of::<B>()));

        let _ = registry.resolve::<A>();
        let _ = registry.resolve::<B>();
        let _ = registry.resolve::<B>();

        assert_eq!(singleton_call_count.load(Ordering::SeqCst), 1);
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 3);

        registry.instantiate_eager().unwrap();
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    #[traced_test]
    fn test_instantiate_eager_error() {
        let registry = Registry::new(Module::new().provide(|Inject(a): Inject<A>| B(a), Config::single().created_at_start(true)));

        assert!(matches!(registry.instantiate_eager(), Err(ResolveErrorKind::Dependency { .. })));
    }

    #[test]
    #[traced_test]
    fn test_instantiate_eager_error_is_repeated() {
        let factory_call_count = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(
            Module::new()
                .provide(counted(&factory_call_count, || A), Config::factory().created_at_start(true))
                .provide(|Inject(b): Inject<B>, Inject(a): Inject<A>| C(b, a), Config::single().created_at_start(true))
                .provide(|| Unregistered, Config::single().created_at_start(true)),
        );

        assert!(matches!(registry.instantiate_eager(), Err(ResolveErrorKind::Dependency { .. })));
        assert!(matches!(registry.instantiate_eager(), Err(ResolveErrorKind::Dependency { .. })));

        // Components before the failing one aren't constructed again, the ones after it never ran
        assert_eq!(factory_call_count.load(Ordering::SeqCst), 1);
        assert!(!registry.is_cached(&ComponentIdentifier::of::<C>()));
        assert!(!registry.is_cached(&ComponentIdentifier::of::<Unregistered>()));
        assert!(format!("{registry:?}").contains("eager_instantiated: 1"));
    }

    #[test]
    #[traced_test]
    fn test_instance() {
        let registry = Registry::new(Module::new().single(instance(5u32)));

        assert_eq!(*registry.resolve::<u32>(), 5);
    }

    #[test]
    #[traced_test]
    fn test_concurrent_first_get() {
        const THREADS: usize = 16;

        let call_count = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new(Module::new().single({
            let call_count = call_count.clone();
            move || {
                call_count.fetch_add(1, Ordering::SeqCst);
                // Widen the window between cache check and insertion
                thread::sleep(Duration::from_millis(20));
                A
            }
        }));
        let barrier = Barrier::new(THREADS);

        let instances = thread::scope(|s| {
            let handles = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        registry.resolve::<A>()
                    })
                })
                .collect::<Vec<_>>();

            handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(instances.len(), THREADS);
        assert!(instances.iter().all(|instance| Arc::ptr_eq(instance, &instances[0])));
    }

    #[test]
    #[traced_test]
    fn test_concurrent_nested_get() {
        const THREADS: usize = 8;

        let registry = Registry::new(
            Module::new()
                .single(|Inject(b): Inject<B>, Inject(a): Inject<A>| C(b, a))
                .single(|Inject(a): Inject<A>| B(a))
                .single(|| A),
        );
        let barrier = Barrier::new(THREADS);

        let instances = thread::scope(|s| {
            let handles = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        debug!("Resolving");
                        registry.resolve::<C>()
                    })
                })
                .collect::<Vec<_>>();

            handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
        });

        assert!(instances.iter().all(|instance| Arc::ptr_eq(instance, &instances[0])));
        assert!(Arc::ptr_eq(&instances[0].0 .0, &instances[0].1));
    }

    #[test]
    fn test_thread_safe() {
        fn impl_bounds<T: Send + Sync + 'static>() {}

        impl_bounds::<Registry>();
    }

    #[test]
    fn test_diagnostics() {
        let registry = Registry::new(Module::new().single(|| A).single_tagged("t", || A));

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.identifiers().count(), 2);
        assert!(registry.descriptor(&ComponentIdentifier::of_tagged::<A>("t")).is_some());
        assert!(Registry::new(Module::new()).is_empty());
        assert!(format!("{registry:?}").contains("components: 2"));

        let _ = registry.resolve::<A>();
        assert!(format!("{registry:?}").contains("cached: 1"));
    }
}
