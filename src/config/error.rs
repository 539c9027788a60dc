//! Configuration-specific error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the dashboard configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Saving before any file location was chosen
    #[error("No configuration file location known")]
    FilePathNotSet,

    /// Default location requires a home directory
    #[error("Could not locate the home directory for the default configuration")]
    HomeDirectoryNotFound,

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File exists but is not valid YAML for the expected fields
    #[error("Malformed configuration in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Could not encode configuration: {0}")]
    Encode(String),

    #[error("Area names must not be empty")]
    EmptyArea,
}
