//! Shared configuration for hubmesh tools.
//!
//! TOML file plus `HUBMESH_`-prefixed environment overrides, platform
//! directory resolution, and translation to the runtime options
//! `hubmesh_core` expects (`StoreConfig`, `TopologyConfig`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubmesh_core::{DEFAULT_LISTEN_PORT, StoreConfig, TopologyConfig};

/// Database file name inside the data directory.
pub const STORE_FILE_NAME: &str = "hubmesh.redb";

/// Output formats the front end understands.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "plain"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSection {
    /// Database file. Defaults to `<data dir>/hubmesh.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Bounded wait for another process to release the store.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Listen port for hubs and members created without one.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            output: default_output(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    1000
}
fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}
fn default_output() -> String {
    "table".into()
}

impl Config {
    /// Reject values the core would only fail on later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.listen_port == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.listen_port".into(),
                reason: "must be between 1 and 65535".into(),
            });
        }
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.defaults.output
                ),
            });
        }
        Ok(())
    }

    /// Effective database path.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join(STORE_FILE_NAME))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.store_path())
            .with_lock_timeout(Duration::from_millis(self.store.lock_timeout_ms))
    }

    pub fn topology_config(&self) -> TopologyConfig {
        TopologyConfig {
            default_listen_port: self.defaults.listen_port,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "hubmesh", "hubmesh")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding the default database file.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(subdir: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(subdir);
    p.push("hubmesh");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HUBMESH_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Rendering ───────────────────────────────────────────────────────

impl Config {
    /// Effective settings as TOML, with the resolved store path filled in.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut resolved = self.clone();
        resolved.store.path = Some(self.store_path());
        Ok(toml::to_string_pretty(&resolved)?)
    }
}
