//! User settings for the flowsync CLI.
//!
//! # Storage layout
//!
//! ```text
//! ~/.flowsync/
//!   config.yaml   (mode 0600)
//! ```
//!
//! # API pattern
//!
//! Loading has two forms:
//! - `load_at(home: &Path)` — explicit home; used in tests with `TempDir`
//! - `load()` — derives home from `dirs::home_dir()`, delegates to `load_at`
//!
//! Settings are written with `save_at`; the CLI only reads them.
//!
//! Environment overrides (`FLOWSYNC_*`) are applied on top of the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ProjectId;

pub const ENV_AGENT_DIR: &str = "FLOWSYNC_AGENT_DIR";
pub const ENV_PROJECT_ID: &str = "FLOWSYNC_PROJECT_ID";
pub const ENV_BASE_URL: &str = "FLOWSYNC_BASE_URL";
pub const ENV_API_KEY: &str = "FLOWSYNC_API_KEY";

pub const DEFAULT_LOCALE_CACHE_TTL_SECS: u64 = 10;
pub const DEFAULT_TRAIN_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_TRAIN_POLL_INTERVAL_MS: u64 = 500;

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the local mirror; flows live under `<agent_dir>/flows`.
    pub agent_dir: PathBuf,
    pub project_id: ProjectId,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_locale_ttl")]
    pub locale_cache_ttl_secs: u64,
    #[serde(default = "default_train_timeout")]
    pub train_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub train_poll_interval_ms: u64,
}

fn default_locale_ttl() -> u64 {
    DEFAULT_LOCALE_CACHE_TTL_SECS
}

fn default_train_timeout() -> u64 {
    DEFAULT_TRAIN_TIMEOUT_MS
}

fn default_poll_interval() -> u64 {
    DEFAULT_TRAIN_POLL_INTERVAL_MS
}

/// On-disk shape: every field optional so environment overrides can fill gaps.
#[derive(Debug, Default, Deserialize)]
struct PartialSettings {
    agent_dir: Option<PathBuf>,
    project_id: Option<ProjectId>,
    base_url: Option<String>,
    api_key: Option<String>,
    locale_cache_ttl_secs: Option<u64>,
    train_timeout_ms: Option<u64>,
    train_poll_interval_ms: Option<u64>,
}

/// Values taken from the environment, applied over the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub agent_dir: Option<PathBuf>,
    pub project_id: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Overrides {
    /// Read the `FLOWSYNC_*` variables. Empty values are ignored.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            agent_dir: var(ENV_AGENT_DIR).map(PathBuf::from),
            project_id: var(ENV_PROJECT_ID),
            base_url: var(ENV_BASE_URL),
            api_key: var(ENV_API_KEY),
        }
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.flowsync/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".flowsync").join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load settings from `<home>/.flowsync/config.yaml` and the environment.
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    load_with_overrides_at(home, &Overrides::from_env())
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&home()?)
}

/// Load settings, applying `overrides` instead of reading the environment.
///
/// Returns `ConfigError::NotFound` when the file is absent and there are no
/// overrides at all, `ConfigError::Incomplete` when a required field is still
/// missing after merging.
pub fn load_with_overrides_at(home: &Path, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let path = config_path_at(home);
    let file = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            PartialSettings::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?
        }
    } else if overrides.is_empty() {
        return Err(ConfigError::NotFound { path });
    } else {
        PartialSettings::default()
    };

    let missing = |field: &'static str, env: &'static str| ConfigError::Incomplete {
        field,
        env,
        path: path.clone(),
    };

    Ok(Settings {
        agent_dir: overrides
            .agent_dir
            .clone()
            .or(file.agent_dir)
            .ok_or_else(|| missing("agent_dir", ENV_AGENT_DIR))?,
        project_id: overrides
            .project_id
            .clone()
            .map(ProjectId::from)
            .or(file.project_id)
            .ok_or_else(|| missing("project_id", ENV_PROJECT_ID))?,
        base_url: overrides
            .base_url
            .clone()
            .or(file.base_url)
            .ok_or_else(|| missing("base_url", ENV_BASE_URL))?,
        api_key: overrides.api_key.clone().or(file.api_key),
        locale_cache_ttl_secs: file
            .locale_cache_ttl_secs
            .unwrap_or(DEFAULT_LOCALE_CACHE_TTL_SECS),
        train_timeout_ms: file.train_timeout_ms.unwrap_or(DEFAULT_TRAIN_TIMEOUT_MS),
        train_poll_interval_ms: file
            .train_poll_interval_ms
            .unwrap_or(DEFAULT_TRAIN_POLL_INTERVAL_MS),
    })
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save settings to `<home>/.flowsync/config.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(agent_dir: &Path) -> Settings {
        Settings {
            agent_dir: agent_dir.to_path_buf(),
            project_id: ProjectId::from("proj-1"),
            base_url: "https://api.example.test".to_string(),
            api_key: None,
            locale_cache_ttl_secs: DEFAULT_LOCALE_CACHE_TTL_SECS,
            train_timeout_ms: DEFAULT_TRAIN_TIMEOUT_MS,
            train_poll_interval_ms: DEFAULT_TRAIN_POLL_INTERVAL_MS,
        }
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().unwrap();
        assert!(config_path_at(home.path()).ends_with(".flowsync/config.yaml"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let saved = settings(&home.path().join("agent"));
        save_at(home.path(), &saved).expect("save");
        let loaded = load_with_overrides_at(home.path(), &Overrides::default()).expect("load");
        assert_eq!(loaded, saved);
    }

    #[test]
    fn save_cleans_up_tmp_and_sets_mode() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &settings(home.path())).expect("save");
        let path = config_path_at(home.path());
        assert!(!path.with_file_name("config.yaml.tmp").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
