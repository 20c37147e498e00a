//! Registry error types.
//!
//! All registry subsystems surface errors through [`RegistryError`], which is
//! the single error type returned by every public API in this crate.

/// Unified error type for the operation registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The requested operation group is not registered.
    #[error("operation group not found: {group}")]
    GroupNotFound {
        /// The group name that was looked up.
        group: String,
    },

    /// The requested operation does not exist within its group.
    #[error("operation not found: {group}.{name}")]
    OperationNotFound { group: String, name: String },

    /// An operation with this `(group, name)` pair is already registered.
    #[error("duplicate operation: {group}.{name}")]
    DuplicateOperation { group: String, name: String },

    /// An operation handler failed.
    ///
    /// The message is surfaced verbatim to callers (including sandboxed
    /// scripts, which see it as a catchable exception), so handlers should
    /// produce self-contained messages.
    #[error("{0}")]
    Invocation(String),
}

/// Convenience alias used throughout the registry crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_not_found_display() {
        let err = RegistryError::GroupNotFound {
            group: "core".into(),
        };
        assert_eq!(err.to_string(), "operation group not found: core");
    }

    #[test]
    fn operation_not_found_display() {
        let err = RegistryError::OperationNotFound {
            group: "core".into(),
            name: "core_read_query".into(),
        };
        assert_eq!(err.to_string(), "operation not found: core.core_read_query");
    }

    #[test]
    fn duplicate_operation_display() {
        let err = RegistryError::DuplicateOperation {
            group: "admin".into(),
            name: "admin_optimize_table".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate operation: admin.admin_optimize_table"
        );
    }

    #[test]
    fn invocation_message_is_verbatim() {
        // Scripts match on handler error text, so no prefix is added.
        let err = RegistryError::Invocation("lock wait timeout".into());
        assert_eq!(err.to_string(), "lock wait timeout");
    }
}
