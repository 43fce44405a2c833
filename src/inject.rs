use std::{
    any::type_name,
    fmt::{self, Debug, Formatter},
    ops::Deref,
    sync::{Arc, OnceLock},
};

use crate::{
    any::TypeInfo, dependency_resolver::DependencyResolver, identifier::ComponentIdentifier, root, tag::Tag, Registry, ResolveErrorKind,
};

/// Constructor argument resolved from the registry the component is built by
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        registry.get().map(Self)
    }
}

/// Optional constructor argument: `None` if the component isn't registered.
///
/// A registered component that fails to resolve is still an error.
impl<Dep: Send + Sync + 'static> DependencyResolver for Option<Inject<Dep>> {
    type Error = ResolveErrorKind;

    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        if !registry.resolvable::<Dep>() {
            return Ok(None);
        }
        registry.get().map(|dependency| Some(Inject(dependency)))
    }
}

/// Field-style access to a component of the root registry.
///
/// Holds only the identifier until first access; then resolves the component from the root once
/// and keeps the result for its own lifetime.
///
/// # Panics
/// Dereferencing panics if the root registry isn't defined or the component can't be resolved,
/// the same way [`root::resolve`] does.
pub struct LazyInject<Dep> {
    tag: Option<Tag>,
    cell: OnceLock<Arc<Dep>>,
}

impl<Dep> LazyInject<Dep> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tag: None,
            cell: OnceLock::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn tagged(tag: impl Into<Tag>) -> Self {
        Self {
            tag: Some(tag.into()),
            cell: OnceLock::new(),
        }
    }

    /// Returns the component if it was already resolved
    #[inline]
    #[must_use]
    pub fn get_resolved(&self) -> Option<&Arc<Dep>> {
        self.cell.get()
    }
}

impl<Dep: Send + Sync + 'static> LazyInject<Dep> {
    #[must_use]
    pub fn get(&self) -> &Arc<Dep> {
        self.cell
            .get_or_init(|| root::resolve_identifier(ComponentIdentifier::new(TypeInfo::of::<Dep>(), self.tag.clone())))
    }
}

impl<Dep> Default for LazyInject<Dep> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Dep: Send + Sync + 'static> Deref for LazyInject<Dep> {
    type Target = Dep;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<Dep> Debug for LazyInject<Dep> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInject")
            .field("component", &type_name::<Dep>())
            .field("tag", &self.tag)
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}
