use std::collections::HashMap;

use crate::{any::RcAny, identifier::ComponentIdentifier};

/// Live instances of a registry.
///
/// `map` only ever holds singleton instances, one per identifier.
/// Factory instances warmed at start are kept in `warmed` so they live as long as the registry,
/// but they are never handed out by resolution.
#[derive(Default)]
pub(crate) struct InstanceCache {
    map: HashMap<ComponentIdentifier, RcAny>,
    warmed: Vec<RcAny>,
}

impl InstanceCache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, identifier: &ComponentIdentifier) -> Option<RcAny> {
        self.map.get(identifier).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, identifier: &ComponentIdentifier) -> bool {
        self.map.contains_key(identifier)
    }

    /// Stores the instance unless one is already cached for the identifier.
    /// Returns the instance that ends up cached.
    #[inline]
    pub(crate) fn insert_if_absent(&mut self, identifier: ComponentIdentifier, instance: RcAny) -> RcAny {
        self.map.entry(identifier).or_insert(instance).clone()
    }

    #[inline]
    pub(crate) fn push_warmed(&mut self, instance: RcAny) {
        self.warmed.push(instance);
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub(crate) fn warmed_len(&self) -> usize {
        self.warmed.len()
    }
}
