use super::resolve::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum DefineErrorKind {
    #[error("Root registry is already defined. It isn't allowed to override the root registry at runtime")]
    AlreadyDefined,
    #[error("Root registry is defined, but a component created at start could not be resolved")]
    Eager(#[source] ResolveErrorKind),
}
