//! Error types for flowsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The addressed resource does not exist remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status.
    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// All errors that can arise while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No settings file and the environment does not fill the gap.
    #[error("settings not found at {path}")]
    NotFound { path: PathBuf },

    /// A required setting is missing after applying overrides.
    #[error("setting `{field}` is not configured (set it in {path} or via {env})")]
    Incomplete {
        field: &'static str,
        env: &'static str,
        path: PathBuf,
    },
}
