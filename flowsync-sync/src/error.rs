//! Error types for flowsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use flowsync_core::{LocaleId, TransportError};

/// All errors that abort a sync command.
///
/// Per-item push failures are not errors; they are recorded as
/// [`SkippedItem`](crate::push::SkippedItem)s in the push report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The named flow does not exist remotely.
    #[error("flow '{name}' can't be found remotely")]
    FlowNotFound { name: String },

    /// `locales.json` has never been pulled.
    #[error("missing locale cache at {path}; run `flowsync pull locales` first")]
    MissingLocales { path: PathBuf },

    /// A flow (or one of its locales) lacks the files a command needs.
    #[error("flow '{flow}'{} has no valid local state: missing {}", locale_suffix(.locale), .path.display())]
    MissingLocalState {
        flow: String,
        locale: Option<String>,
        path: PathBuf,
    },

    /// A flow or locale name that cannot be used as a single path component.
    #[error("{kind} name '{name}' cannot be used as a directory name")]
    InvalidName { kind: &'static str, name: String },

    /// Binding a flow's name/locale failed during push.
    #[error("updating flow '{flow}' for locale {locale} failed: {source}")]
    FlowUpdate {
        flow: String,
        locale: LocaleId,
        #[source]
        source: TransportError,
    },

    /// A remote read failed.
    #[error("remote call failed: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mirror file could not be (de)serialized.
    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn locale_suffix(locale: &Option<String>) -> String {
    match locale {
        Some(name) => format!(" in locale {name}"),
        None => String::new(),
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Json`].
pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> SyncError {
    SyncError::Json {
        path: path.into(),
        source,
    }
}
