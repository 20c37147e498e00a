//! Capability layer error types.

use dbscript_registry::RegistryError;

/// Unified error type for the capability binding layer.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The requested group is not part of this binding.
    #[error("unknown capability group: {group}")]
    UnknownGroup { group: String },

    /// The requested method (canonical or alias) is not part of the group.
    #[error("unknown capability method: {group}.{method}")]
    UnknownMethod { group: String, method: String },

    /// Two registered operations map to the same callable name after the
    /// naming transform, so the binding cannot be built.
    #[error("method name collision in group {group}: {method}")]
    MethodCollision { group: String, method: String },

    /// The underlying operation failed. Displayed transparently so that
    /// handler error text reaches scripts verbatim.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Convenience alias used throughout the capability crate.
pub type Result<T> = std::result::Result<T, CapabilityError>;
