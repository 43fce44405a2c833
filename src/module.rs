use std::collections::{hash_map::Entry, HashMap};
use tracing::{debug, warn};

use crate::{
    config::Config, dependency_resolver::DependencyResolver, descriptor::ComponentDescriptor, identifier::ComponentIdentifier,
    instantiator::Instantiator, merge::Merge, tag::Tag,
};

/// Composable collection of component descriptors.
///
/// Descriptors keep the order of their first registration.
/// Registering an identifier again replaces the earlier descriptor in place (last registration wins),
/// which is how a later module shadows components of an earlier one.
#[derive(Default, Clone, Debug)]
pub struct Module {
    descriptors: Vec<ComponentDescriptor>,
    positions: HashMap<ComponentIdentifier, usize>,
}

impl Module {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a singleton: constructed once on first resolution and shared afterwards
    #[inline]
    #[must_use]
    pub fn single<Inst, Deps>(self, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.provide(instantiator, Config::single())
    }

    #[inline]
    #[must_use]
    pub fn single_tagged<Inst, Deps>(self, tag: impl Into<Tag>, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.provide_tagged(tag, instantiator, Config::single())
    }

    /// Registers a factory: constructed anew on every resolution
    #[inline]
    #[must_use]
    pub fn factory<Inst, Deps>(self, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.provide(instantiator, Config::factory())
    }

    #[inline]
    #[must_use]
    pub fn factory_tagged<Inst, Deps>(self, tag: impl Into<Tag>, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.provide_tagged(tag, instantiator, Config::factory())
    }

    #[inline]
    #[must_use]
    pub fn provide<Inst, Deps>(mut self, instantiator: Inst, config: Config) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.add(ComponentDescriptor::new(None, instantiator, config));
        self
    }

    #[inline]
    #[must_use]
    pub fn provide_tagged<Inst, Deps>(mut self, tag: impl Into<Tag>, instantiator: Inst, config: Config) -> Self
    where
        Inst: Instantiator<Deps> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.add(ComponentDescriptor::new(Some(tag.into()), instantiator, config));
        self
    }

    /// Appends all descriptors of another module, see [`compose`]
    #[inline]
    #[must_use]
    pub fn include(self, other: Module) -> Self {
        self.merge(other)
    }

    /// Adds a descriptor.
    /// Returns the descriptor it replaced if the identifier was already registered.
    pub fn add(&mut self, descriptor: ComponentDescriptor) -> Option<ComponentDescriptor> {
        match self.positions.entry(descriptor.identifier().clone()) {
            Entry::Occupied(entry) => {
                warn!(identifier = %entry.key(), "Component registered again, the later registration wins");
                Some(std::mem::replace(&mut self.descriptors[*entry.get()], descriptor))
            }
            Entry::Vacant(entry) => {
                debug!(identifier = %entry.key(), "Component registered");
                entry.insert(self.descriptors.len());
                self.descriptors.push(descriptor);
                None
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, identifier: &ComponentIdentifier) -> Option<&ComponentDescriptor> {
        self.positions.get(identifier).map(|&position| &self.descriptors[position])
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, identifier: &ComponentIdentifier) -> bool {
        self.positions.contains_key(identifier)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[inline]
    #[must_use]
    pub(crate) fn into_descriptors(self) -> Vec<ComponentDescriptor> {
        self.descriptors
    }
}

impl FromIterator<ComponentDescriptor> for Module {
    fn from_iter<I: IntoIterator<Item = ComponentDescriptor>>(iter: I) -> Self {
        iter.into_iter().fold(Module::new(), Merge::merge)
    }
}

impl Extend<ComponentDescriptor> for Module {
    fn extend<I: IntoIterator<Item = ComponentDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.add(descriptor);
        }
    }
}

/// Flattens modules into one, in order.
///
/// Modules may themselves be compositions of other modules.
/// On duplicate identifiers the descriptor from the later module wins.
#[must_use]
pub fn compose<I>(parts: I) -> Module
where
    I: IntoIterator<Item = Module>,
{
    parts.into_iter().fold(Module::new(), Merge::merge)
}
