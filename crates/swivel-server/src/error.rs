//! Command surface error types.

use thiserror::Error;

use swivel_proxy::ProxyError;

/// Errors raised while handling a command.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested configuration id absent from the store.
    #[error("Configuration not found")]
    NotFound,

    /// The submitted configuration failed validation.
    #[error("{0}")]
    Validation(String),

    /// Malformed command input.
    #[error("{0}")]
    BadRequest(String),

    /// Proxy control error.
    #[error("{0}")]
    Proxy(#[from] ProxyError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] swivel_storage::StorageError),
}

impl ApiError {
    /// Message suitable for direct display.
    ///
    /// Platform-level failures get curated wording; only uncategorized
    /// errors fall back to their raw text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Proxy(ProxyError::Platform(_)) => {
                "Failed to apply proxy settings. Please try again.".to_string()
            }
            ApiError::Proxy(ProxyError::NotFound) => "Configuration not found".to_string(),
            // Format errors are surfaced verbatim.
            ApiError::Storage(swivel_storage::StorageError::Format(err)) => err.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for command handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
