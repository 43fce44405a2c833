#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod dependency_resolver;
pub(crate) mod descriptor;
pub(crate) mod errors;
pub(crate) mod identifier;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod merge;
pub(crate) mod module;
pub(crate) mod registry;
pub(crate) mod tag;

pub mod root;

pub use any::TypeInfo;
pub use config::{Config, Lifetime};
pub use dependency_resolver::DependencyResolver;
pub use descriptor::ComponentDescriptor;
pub use errors::{DefineErrorKind, ResolveErrorKind};
pub use identifier::ComponentIdentifier;
pub use inject::{Inject, LazyInject};
pub use instantiator::{instance, Instantiator};
pub use merge::Merge;
pub use module::{compose, Module};
pub use registry::Registry;
pub use tag::Tag;
