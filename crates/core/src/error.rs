//! Domain error model.

use thiserror::Error;

/// Result type used across the authorization core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, configuration,
/// conflicts). Transport and persistence concerns belong to the stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value supplied at runtime failed validation (e.g. malformed
    /// capability string via a custom-role API).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Loaded configuration is invalid. Raised at load time, never
    /// per-request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. duplicate role name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external collaborator (store, policy engine) was unavailable.
    /// Callers must treat this as a deny (fail-closed).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
