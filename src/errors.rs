mod define;
mod resolve;

pub use define::DefineErrorKind;
pub use resolve::ResolveErrorKind;
