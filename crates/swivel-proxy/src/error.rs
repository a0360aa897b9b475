//! Error types for proxy control.

use thiserror::Error;

/// Errors raised while applying, clearing, or testing a configuration.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Requested configuration id absent from the store.
    #[error("Configuration not found")]
    NotFound,

    /// The configuration failed validation; carries the validator's reason.
    #[error("{0}")]
    Invalid(String),

    /// The configuration could not be translated into a directive.
    #[error("{0}")]
    Rules(#[from] swivel_core::RulesError),

    /// The platform rejected the directive after bounded retries.
    #[error("Failed to apply proxy settings: {0}")]
    Platform(String),

    /// The post-apply commit (current id, statistics, indicator) failed.
    #[error("Failed to record proxy state: {0}")]
    Commit(String),

    /// The connection probe failed; the message distinguishes timeouts.
    #[error("{0}")]
    Probe(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] swivel_storage::StorageError),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
