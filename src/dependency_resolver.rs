use super::errors::ResolveErrorKind;
use crate::Registry;

/// Argument of a construction closure that is resolved from the registry right before the closure runs
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(registry: &Registry) -> Result<Self, Self::Error>;
}

/// Gives the construction closure a handle to the registry itself,
/// e.g. to resolve tagged components.
impl DependencyResolver for Registry {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        Ok(registry.clone())
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(registry).map_err(Into::<ResolveErrorKind>::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
