/// Instance reuse policy of a component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// Constructed once on first resolution, cached and shared afterwards
    #[default]
    Singleton,
    /// Constructed anew on every resolution, never cached
    Factory,
}

/// Config for a registration
/// ## Fields
/// - `lifetime`:
///   Whether the instance is cached and reused ([`Lifetime::Singleton`]) or built per resolution ([`Lifetime::Factory`]).
///
/// - `created_at_start`:
///   If `true`, one instance is constructed when the registry is defined as root,
///   before any explicit resolution.
///
///   For a factory this only warms a single instance at start.
///   Later resolutions still return fresh instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub lifetime: Lifetime,
    pub created_at_start: bool,
}

impl Config {
    #[inline]
    #[must_use]
    pub const fn single() -> Self {
        Self {
            lifetime: Lifetime::Singleton,
            created_at_start: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn factory() -> Self {
        Self {
            lifetime: Lifetime::Factory,
            created_at_start: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn created_at_start(mut self, created_at_start: bool) -> Self {
        self.created_at_start = created_at_start;
        self
    }
}
