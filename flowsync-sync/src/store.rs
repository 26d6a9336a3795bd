//! The on-disk mirror of remote flows.
//!
//! ```text
//! <agent_dir>/flows/locales.json
//! <agent_dir>/flows/<flow>/config.json
//! <agent_dir>/flows/<flow>/<locale>/chart.json
//! <agent_dir>/flows/<flow>/<locale>/intents.json
//! ```
//!
//! All files are pretty-printed JSON with 4-space indentation, written to a
//! `.flowsync.tmp` sibling and renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;

use flowsync_core::{Locale, ProjectId, Transport};

use crate::error::{io_err, json_err, SyncError};

pub const FLOWS_DIR: &str = "flows";
pub const LOCALES_FILE: &str = "locales.json";
pub const CONFIG_FILE: &str = "config.json";
pub const CHART_FILE: &str = "chart.json";
pub const INTENTS_FILE: &str = "intents.json";

/// Default staleness window of the locale cache.
pub const DEFAULT_LOCALE_TTL: Duration = Duration::from_secs(10);

/// Reject names that would not map to exactly one directory under the
/// mirror: empty, `.`, `..`, or anything with a path separator.
pub fn validate_name(kind: &'static str, name: &str) -> Result<(), SyncError> {
    let unsafe_name =
        name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(SyncError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Reads and writes the local mirror rooted at an agent directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    agent_dir: PathBuf,
}

impl LocalStore {
    pub fn new(agent_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent_dir: agent_dir.into(),
        }
    }

    pub fn agent_dir(&self) -> &Path {
        &self.agent_dir
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    pub fn flows_dir(&self) -> PathBuf {
        self.agent_dir.join(FLOWS_DIR)
    }

    pub fn locales_path(&self) -> PathBuf {
        self.flows_dir().join(LOCALES_FILE)
    }

    pub fn flow_dir(&self, flow_name: &str) -> PathBuf {
        self.flows_dir().join(flow_name)
    }

    pub fn config_path(&self, flow_name: &str) -> PathBuf {
        self.flow_dir(flow_name).join(CONFIG_FILE)
    }

    pub fn locale_dir(&self, flow_name: &str, locale_name: &str) -> PathBuf {
        self.flow_dir(flow_name).join(locale_name)
    }

    pub fn chart_path(&self, flow_name: &str, locale_name: &str) -> PathBuf {
        self.locale_dir(flow_name, locale_name).join(CHART_FILE)
    }

    pub fn intents_path(&self, flow_name: &str, locale_name: &str) -> PathBuf {
        self.locale_dir(flow_name, locale_name).join(INTENTS_FILE)
    }

    // -----------------------------------------------------------------------
    // JSON documents
    // -----------------------------------------------------------------------

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, SyncError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_json::from_str(&contents).map_err(|e| json_err(path, e))
    }

    /// Like [`read_json`](Self::read_json), but a missing file yields `None`.
    pub fn read_json_opt<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, SyncError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| json_err(path, e)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(path, err)),
        }
    }

    /// Atomically write `doc` as 4-space indented JSON, creating parents.
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, doc: &T) -> Result<(), SyncError> {
        let rendered = to_pretty_json(doc).map_err(|e| json_err(path, e))?;
        let tmp = PathBuf::from(format!("{}.flowsync.tmp", path.display()));
        write_atomic(path, &tmp, &rendered)?;
        tracing::info!("wrote: {}", path.display());
        Ok(())
    }

    /// Remove `path` if it exists, then recreate it empty.
    pub fn ensure_empty_dir(&self, path: &Path) -> Result<(), SyncError> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => tracing::debug!("cleared: {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(path, err)),
        }
        std::fs::create_dir_all(path).map_err(|e| io_err(path, e))
    }

    /// Names of the flow directories in the mirror, sorted.
    pub fn list_flow_dirs(&self) -> Result<Vec<String>, SyncError> {
        let dir = self.flows_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&dir, err)),
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    // -----------------------------------------------------------------------
    // Locale cache
    // -----------------------------------------------------------------------

    /// The cached locale list, or `None` if it has never been pulled.
    pub fn cached_locales(&self) -> Result<Option<Vec<Locale>>, SyncError> {
        self.read_json_opt(&self.locales_path())
    }

    /// Project locales, served from `locales.json` while its modification
    /// time is within `ttl` of now and refetched (and rewritten) otherwise.
    pub fn get_locales(
        &self,
        transport: &dyn Transport,
        project: &ProjectId,
        ttl: Duration,
    ) -> Result<Vec<Locale>, SyncError> {
        let path = self.locales_path();
        if let Some(age) = file_age(&path)? {
            if age <= ttl {
                match self.read_json::<Vec<Locale>>(&path) {
                    Ok(locales) => {
                        tracing::debug!("locale cache hit ({}s old)", age.as_secs());
                        return Ok(locales);
                    }
                    Err(err) => tracing::warn!("ignoring unreadable locale cache: {err}"),
                }
            }
        }
        self.refresh_locales(transport, project)
    }

    /// Fetch locales from the remote and rewrite the cache unconditionally.
    pub fn refresh_locales(
        &self,
        transport: &dyn Transport,
        project: &ProjectId,
    ) -> Result<Vec<Locale>, SyncError> {
        let locales = transport.list_locales(project)?;
        self.write_json(&self.locales_path(), &locales)?;
        Ok(locales)
    }
}

/// Time since `path` was last modified; `None` if it does not exist.
/// Modification times in the future count as fresh.
fn file_age(path: &Path) -> Result<Option<Duration>, SyncError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    let modified = meta.modified().map_err(|e| io_err(path, e))?;
    Ok(Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    ))
}

fn to_pretty_json<T: Serialize + ?Sized>(doc: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    Ok(buf)
}

fn write_atomic(path: &Path, tmp: &Path, content: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
