use std::fmt::{self, Display, Formatter};

use crate::{any::TypeInfo, tag::Tag};

/// Key of a component: the declared type and an optional tag.
///
/// Two identifiers are equal only if both the types and the tags are equal,
/// so a tagged and an untagged registration of the same type never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentIdentifier {
    pub type_info: TypeInfo,
    pub tag: Option<Tag>,
}

impl ComponentIdentifier {
    #[inline]
    #[must_use]
    pub const fn new(type_info: TypeInfo, tag: Option<Tag>) -> Self {
        Self { type_info, tag }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), None)
    }

    #[inline]
    #[must_use]
    pub fn of_tagged<T: ?Sized + 'static>(tag: impl Into<Tag>) -> Self {
        Self::new(TypeInfo::of::<T>(), Some(tag.into()))
    }
}

impl Display for ComponentIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{} (tag: {tag:?})", self.type_info.name),
            None => f.write_str(self.type_info.name),
        }
    }
}
