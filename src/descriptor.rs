use std::fmt::{self, Debug, Formatter};

use crate::{
    any::{RcAny, TypeInfo},
    config::{Config, Lifetime},
    dependency_resolver::DependencyResolver,
    errors::ResolveErrorKind,
    identifier::ComponentIdentifier,
    instantiator::{erase_instantiator, ErasedInstantiator, Instantiator},
    tag::Tag,
    Registry,
};

/// Immutable registration record: how to construct a component and how long its instances live
#[derive(Clone)]
pub struct ComponentDescriptor {
    identifier: ComponentIdentifier,
    config: Config,
    instantiator: ErasedInstantiator,
}

impl ComponentDescriptor {
    /// Creates a descriptor for the type provided by the instantiator
    #[must_use]
    pub fn new<Inst, Deps>(tag: Option<Tag>, instantiator: Inst, config: Config) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        Self {
            identifier: ComponentIdentifier::new(TypeInfo::of::<Inst::Provides>(), tag),
            config,
            instantiator: erase_instantiator(instantiator),
        }
    }

    #[inline]
    #[must_use]
    pub const fn identifier(&self) -> &ComponentIdentifier {
        &self.identifier
    }

    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.config.lifetime
    }

    #[inline]
    #[must_use]
    pub const fn is_created_at_start(&self) -> bool {
        self.config.created_at_start
    }

    /// Runs the construction closure once, resolving its arguments from `registry`
    pub(crate) fn instantiate(&self, registry: &Registry) -> Result<RcAny, ResolveErrorKind> {
        (self.instantiator)(registry).map_err(|err| ResolveErrorKind::Dependency {
            identifier: self.identifier.clone(),
            source: Box::new(err),
        })
    }
}

impl Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("identifier", &self.identifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
