//! Error types for the capability resolution engine

use thiserror::Error;

/// Configuration errors surfaced by the engine
///
/// These are operator errors, raised at the point of misconfiguration
/// (catalog registration or role assignment) or when a role name that was
/// never declared is queried. A denied check is a normal `Ok(false)`
/// outcome, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A role assignment referenced a permission set id the catalog does not know
    #[error("Unknown permission set: {0}")]
    UnknownPermissionSet(String),

    /// A role name was queried that has never been assigned in the registry
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A permission set id was registered twice in the catalog
    #[error("Duplicate permission set registration: {0}")]
    DuplicatePermissionSet(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ConfigurationError>;
