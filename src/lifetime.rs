use std::fmt;

/// Policy governing how long a resolved instance is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance on every resolution.
    Transient,
    /// One instance per scope, created on first resolution within that scope
    /// and released when the scope is disposed.
    PerScope,
    /// One instance per container, shared across all scopes.
    Singleton,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => write!(f, "transient"),
            Lifetime::PerScope => write!(f, "per-scope"),
            Lifetime::Singleton => write!(f, "singleton"),
        }
    }
}
