use std::sync::Arc;
use tracing::debug;

use super::{any::RcAny, dependency_resolver::DependencyResolver, errors::ResolveErrorKind};
use crate::Registry;

/// Construction closure of a component.
///
/// Implemented for every `Fn(Deps...) -> Provides` whose arguments are [`DependencyResolver`]s,
/// so a plain `|| Component` is an instantiator without dependencies.
/// The closure is shared between threads and may run concurrently for factories.
pub trait Instantiator<Deps>: 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;

    fn instantiate(&self, dependencies: Deps) -> Self::Provides;
}

/// Erased construction closure stored by a descriptor.
/// Clones of a descriptor share it.
pub(crate) type ErasedInstantiator = Arc<dyn Fn(&Registry) -> Result<RcAny, ResolveErrorKind> + Send + Sync>;

#[must_use]
pub(crate) fn erase_instantiator<Inst, Deps>(instantiator: Inst) -> ErasedInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver,
{
    Arc::new(move |registry: &Registry| -> Result<RcAny, ResolveErrorKind> {
        let dependencies = Deps::resolve(registry).map_err(Into::<ResolveErrorKind>::into)?;
        let dependency = instantiator.instantiate(dependencies);

        debug!("Instantiated");

        Ok(Arc::new(dependency))
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Response + 'static,
            Response: 'static,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;

            fn instantiate(&self, ($($ty,)*): ($($ty,)*)) -> Self::Provides {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the registry.
#[inline]
#[must_use]
pub fn instance<T: Clone + 'static>(val: T) -> impl Instantiator<(), Provides = T> {
    move || val.clone()
}

/// Creates a `Box<dyn Trait>` from a value, optionally including supertraits.
///
/// # Syntax
/// ```text
/// boxed!(value; Trait [+ SuperTrait1 [+ SuperTrait2 ...]])
/// ```
///
/// # Examples
/// ```rust
/// use wirebox::{boxed, Module, Registry};
///
/// trait UserRepo: Send + Sync {}
///
/// struct PostgresUserRepo;
///
/// impl UserRepo for PostgresUserRepo {}
///
/// let registry = Registry::new(Module::new().single(|| boxed!(PostgresUserRepo; UserRepo + Send + Sync)));
///
/// assert!(registry.resolvable::<Box<dyn UserRepo + Send + Sync>>());
/// ```
#[macro_export]
macro_rules! boxed {
    ($val:expr ; $trait:tt $($super_traits:tt)*) => {{
        Box::new($val) as Box<dyn $r#trait $($super_traits)*>
    }};
}
