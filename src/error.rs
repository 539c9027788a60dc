//! Application-wide error types.
//!
//! This module defines the main error type hierarchy for the crate,
//! allowing for type-safe error handling throughout the codebase.

pub use crate::config::ConfigError;
pub use crate::state::StateError;
pub use crate::store::StoreError;

/// Main application error type.
///
/// This is the top-level error type that encompasses all error types
/// in the crate. It uses `thiserror` for automatic error derivation
/// and conversion.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task store errors
    #[error("{0}")]
    Store(#[from] StoreError),

    /// State management errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Input rejected locally, never sent to the store
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger initialization errors
    #[error("Logger error: {0}")]
    Logger(String),
}

impl AppError {
    /// Return the store failure behind this error, if any.
    ///
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            AppError::Store(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure means the dashboard still needs setup rather
    /// than showing an error.
    ///
    pub fn needs_setup(&self) -> bool {
        matches!(self, AppError::Store(StoreError::Unconfigured))
    }
}

/// Convenience type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
