//! Error types for the status registry.

/// Errors returned by [`StatusRegistry`](crate::StatusRegistry) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// An attribute with this name is already registered.
    #[error("status attribute already registered: {name}")]
    Duplicate {
        /// The conflicting attribute name.
        name: String,
    },

    /// No attribute with this name is registered.
    #[error("unknown status attribute: {name}")]
    Unknown {
        /// The missing attribute name.
        name: String,
    },

    /// The name is empty or contains a path separator or whitespace.
    #[error("invalid status attribute name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The registry still has attributes and cannot be destroyed.
    #[error("status registry {registry} still holds {remaining} attribute(s)")]
    NotEmpty {
        /// Name of the registry.
        registry: String,
        /// Number of attributes still registered.
        remaining: usize,
    },
}
