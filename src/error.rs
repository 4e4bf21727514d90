//! Error types for websessions
//!
//! Only construction and caller-supplied loaders surface errors from the
//! cache; everything else is logged and swallowed. See `cache::flatfile`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for websessions operations
pub type WebSessionResult<T> = Result<T, WebSessionError>;

/// Boxed error produced by a caller-supplied loader
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can occur in websessions
#[derive(Error, Debug)]
pub enum WebSessionError {
    // Cache errors
    #[error("Invalid cache key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Loading value for {key} failed: {source}")]
    Loader {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Reaper errors
    #[error("Reaper is already scheduled")]
    ReaperAlreadyRunning,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl WebSessionError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a loader failure for `key`
    pub fn loader(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Loader {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheDirCreate { .. } => {
                Some("Check permissions, or point [cache] directory elsewhere with --dir")
            }
            Self::ConfigInvalid { .. } => Some("Run: websessions config show"),
            Self::ConfigNotFound(_) => Some("Run: websessions config init"),
            _ => None,
        }
    }
}
