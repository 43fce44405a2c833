//! Process-wide root registry.
//!
//! The root goes through `unset -> defined` exactly once. [`reset`] brings it back to unset
//! so independent test runs can define their own root.

use parking_lot::{const_rwlock, RwLock};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    errors::{DefineErrorKind, ResolveErrorKind},
    identifier::ComponentIdentifier,
    registry::fatal,
    tag::Tag,
    Registry,
};

static ROOT: RwLock<Option<Registry>> = const_rwlock(None);

/// Binds the registry as root and constructs its components flagged as created at start.
///
/// # Panics
/// - Panics if a root registry is already defined.
///   Overriding the root at runtime would leave two configurations believing they are active.
/// - Panics if a component created at start can't be resolved.
#[track_caller]
pub fn define(registry: impl Into<Registry>) {
    if let Err(err) = try_define(registry) {
        match &err {
            DefineErrorKind::AlreadyDefined => {
                error!("{}", err);
                panic!("{err}");
            }
            DefineErrorKind::Eager(source) => fatal(source),
        }
    }
}

/// Same as [`define`], but reports misuse as an error instead of panicking.
///
/// # Errors
/// - Returns [`DefineErrorKind::AlreadyDefined`] if a root registry is already defined; the existing root is kept
/// - Returns [`DefineErrorKind::Eager`] if a component created at start can't be resolved.
///   The registry stays defined as root in this case.
pub fn try_define(registry: impl Into<Registry>) -> Result<(), DefineErrorKind> {
    let registry = registry.into();
    {
        let mut root = ROOT.write();
        if root.is_some() {
            return Err(DefineErrorKind::AlreadyDefined);
        }
        *root = Some(registry.clone());
    }
    info!(components = registry.len(), "Root registry defined");

    // The lock is released, so components created at start may resolve through the root
    registry.instantiate_eager().map_err(DefineErrorKind::Eager)
}

#[inline]
#[must_use]
pub fn is_defined() -> bool {
    ROOT.read().is_some()
}

/// Unbinds the root registry so [`define`] can be called again.
///
/// The previous registry isn't cleared, it's only dropped once nothing else holds it.
/// Intended for isolating tests.
pub fn reset() {
    if ROOT.write().take().is_some() {
        debug!("Root registry reset");
    }
}

/// Returns the root registry if it's defined
#[inline]
#[must_use]
pub fn get() -> Option<Registry> {
    ROOT.read().clone()
}

/// Resolves an untagged component from the root registry.
///
/// # Panics
/// Panics if the root registry isn't defined or the component can't be resolved
#[must_use]
#[track_caller]
pub fn resolve<Dep: Send + Sync + 'static>() -> Arc<Dep> {
    resolve_identifier(ComponentIdentifier::of::<Dep>())
}

/// # Panics
/// Panics if the root registry isn't defined or the component can't be resolved
#[must_use]
#[track_caller]
pub fn resolve_tagged<Dep: Send + Sync + 'static>(tag: impl Into<Tag>) -> Arc<Dep> {
    resolve_identifier(ComponentIdentifier::of_tagged::<Dep>(tag))
}

/// # Panics
/// Panics if the root registry isn't defined or the component can't be resolved
#[must_use]
#[track_caller]
pub fn resolve_identifier<Dep: Send + Sync + 'static>(identifier: ComponentIdentifier) -> Arc<Dep> {
    match get_by_identifier(identifier) {
        Some(Ok(dependency)) => dependency,
        Some(Err(err)) => fatal(&err),
        None => {
            error!("Root registry isn't defined");
            panic!("Root registry isn't defined. Call `root::define` at startup before resolving components");
        }
    }
}

/// Resolves an untagged component from the root registry, returning `None` instead of failing
#[must_use]
pub fn try_resolve<Dep: Send + Sync + 'static>() -> Option<Arc<Dep>> {
    get().and_then(|registry| registry.try_resolve())
}

#[must_use]
pub fn try_resolve_tagged<Dep: Send + Sync + 'static>(tag: impl Into<Tag>) -> Option<Arc<Dep>> {
    get().and_then(|registry| registry.try_resolve_tagged(tag))
}

/// Checks whether an untagged component is registered in the root registry.
/// Returns `false` if the root registry isn't defined.
#[must_use]
pub fn resolvable<Dep: ?Sized + 'static>() -> bool {
    get().is_some_and(|registry| registry.resolvable::<Dep>())
}

#[must_use]
pub fn resolvable_tagged<Dep: ?Sized + 'static>(tag: impl Into<Tag>) -> bool {
    get().is_some_and(|registry| registry.resolvable_tagged::<Dep>(tag))
}

fn get_by_identifier<Dep: Send + Sync + 'static>(identifier: ComponentIdentifier) -> Option<Result<Arc<Dep>, ResolveErrorKind>> {
    // Clone the handle out so the root lock isn't held during construction
    let registry = get()?;
    Some(registry.get_by_identifier(identifier))
}
