use std::any::TypeId;

use crate::{any::TypeInfo, identifier::ComponentIdentifier};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Component `{identifier}` could not be resolved: no registration found")]
    NoComponent { identifier: ComponentIdentifier },
    #[error("Incorrect provided type of component `{identifier}`. Actual: {actual:?}, expected: {}", expected.name)]
    IncorrectType {
        identifier: ComponentIdentifier,
        expected: TypeInfo,
        actual: TypeId,
    },
    #[error("Dependency of component `{identifier}` could not be resolved")]
    Dependency {
        identifier: ComponentIdentifier,
        #[source]
        source: Box<ResolveErrorKind>,
    },
}

impl ResolveErrorKind {
    /// Identifier of the component whose resolution failed
    #[must_use]
    pub fn identifier(&self) -> &ComponentIdentifier {
        match self {
            Self::NoComponent { identifier } | Self::IncorrectType { identifier, .. } | Self::Dependency { identifier, .. } => identifier,
        }
    }

    /// Walks the `Dependency` chain down to the failure that started it
    #[must_use]
    pub fn root_cause(&self) -> &ResolveErrorKind {
        match self {
            Self::Dependency { source, .. } => source.root_cause(),
            _ => self,
        }
    }
}
