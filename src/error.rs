//! Error types for the configuration registry.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry and configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while resolving, loading, saving or binding configurations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Parent directory of a configuration file could not be created.
    #[error("Unable to create configuration directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The key's storage path cannot be used as a file location.
    #[error("Invalid configuration path {path}: {message}")]
    PathResolution { path: PathBuf, message: String },

    /// First-time initialization of a key failed. Nothing was cached.
    #[error("Unable to bootstrap configuration '{key}': {source}")]
    Bootstrap {
        key: String,
        source: Arc<ConfigError>,
    },

    /// The backing document could not be read or parsed.
    #[error("Unable to load configuration from {path}: {source}")]
    Load { path: PathBuf, source: CodecError },

    /// The backing document could not be written.
    #[error("Unable to save configuration to {path}: {source}")]
    Save { path: PathBuf, source: CodecError },

    /// The document does not fit the typed shape, or the other way round.
    #[error("Configuration '{key}' does not match its typed shape: {source}")]
    Binding {
        key: String,
        source: serde_json::Error,
    },

    /// A key id was registered with a different typed shape.
    #[error("Configuration '{key}' is registered with a different type than {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The registry settings file is unreadable or malformed.
    #[error("Invalid registry settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },
}

/// Low-level failure of a loader, before path context is attached.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not exist and the loader is configured to fail on it.
    #[error("file does not exist")]
    Missing,

    #[error("malformed {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("cannot represent document as {format}: {message}")]
    Render {
        format: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Innermost cause of a bootstrap failure, or `self` for any other error.
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            ConfigError::Bootstrap { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
