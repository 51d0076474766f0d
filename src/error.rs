use thiserror::Error;

/// Failures raised by registration and resolution.
///
/// The host-facing adapter in [`crate::resolver`] converts
/// [`ContainerError::UnresolvedService`] into absence (`None` / empty `Vec`)
/// instead of surfacing it; every other variant is a caller-side defect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No registration exists for the requested `(type, name)` pair.
    #[error("no registration for service {service} with name {name:?}")]
    UnresolvedService { service: String, name: String },

    /// A registration already exists for the `(type, name)` pair.
    /// Re-registering never silently replaces an existing entry.
    #[error("service {service} with name {name:?} is already registered")]
    DuplicateRegistration { service: String, name: String },

    /// A resolution was attempted on a scope after it was disposed.
    #[error("scope has been disposed")]
    ScopeDisposed,

    /// A per-scope service was resolved directly from the container,
    /// outside of any scope.
    #[error("service {service} has per-scope lifetime and no scope is active")]
    ScopeRequired { service: String },
}
