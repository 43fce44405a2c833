use std::{
    any::{Any, TypeId},
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Text of a string-like tag value, whichever string type holds it
fn str_value(value: &dyn Any) -> Option<&str> {
    if let Some(value) = value.downcast_ref::<&'static str>() {
        return Some(value);
    }
    if let Some(value) = value.downcast_ref::<String>() {
        return Some(value);
    }
    value.downcast_ref::<Cow<'static, str>>().map(AsRef::as_ref)
}

trait DynTag: Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn DynTag) -> bool;

    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> DynTag for T
where
    T: Hash + Eq + Debug + Send + Sync + 'static,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynTag) -> bool {
        match (str_value(self), str_value(other.as_any())) {
            (Some(value), Some(other)) => value == other,
            (None, None) => other.as_any().downcast_ref::<T>().is_some_and(|other| self == other),
            _ => false,
        }
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        if let Some(value) = str_value(self) {
            TypeId::of::<str>().hash(&mut state);
            value.hash(&mut state);
            return;
        }
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Disambiguates several registrations of the same component type.
///
/// A tag wraps any hashable value. Two tags are equal only if they hold values of the same type
/// that compare equal, so `Tag::new(1u8)` and `Tag::new(1u16)` are different tags.
///
/// String tags are the exception: `&'static str`, `String` and `Cow<'static, str>` values compare
/// by their text, so `"primary"`, `String::from("primary")` and `Tag::new("primary")`
/// name the same component.
#[derive(Clone)]
pub struct Tag(Arc<dyn DynTag>);

impl Tag {
    #[inline]
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Hash + Eq + Debug + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// Returns the wrapped value if it is of type `T`
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        str_value(self.0.as_any())
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(value) => Debug::fmt(value, f),
            None => Debug::fmt(&*self.0, f),
        }
    }
}

impl From<&'static str> for Tag {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::new(Cow::<'static, str>::Borrowed(value))
    }
}

impl From<String> for Tag {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(Cow::<'static, str>::Owned(value))
    }
}

impl From<Cow<'static, str>> for Tag {
    #[inline]
    fn from(value: Cow<'static, str>) -> Self {
        Self::new(value)
    }
}
