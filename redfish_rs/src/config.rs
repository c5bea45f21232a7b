//! Configuration file support.
//!
//! Loads `redfish.toml` from the user's configuration directory, or the file
//! named by `-c/--config`. Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Condition;

const CONFIG_FILE: &str = "redfish.toml";
const CACHE_DIR: &str = ".redfish";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedfishConfig {
    /// Default management controller URL.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Directory for the debug log file.
    pub logdir: Option<PathBuf>,
    /// Persist sessions between invocations.
    pub cache: bool,
    /// Override for the session cache location.
    pub cache_dir: Option<PathBuf>,
}

impl Default for RedfishConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            logdir: None,
            cache: true,
            cache_dir: None,
        }
    }
}

impl RedfishConfig {
    /// `<config dir>/redfish/redfish.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("redfish").join(CONFIG_FILE))
    }

    /// Loads the explicit file, which must exist and parse, or the default
    /// file, which may be absent.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, Condition> {
        match explicit {
            Some(path) => Self::load_strict(path),
            None => Ok(Self::default_path()
                .map(|path| Self::load_from_path(&path))
                .unwrap_or_default()),
        }
    }

    /// Load config from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("[redfish][warn] Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[redfish][warn] Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn load_strict(path: &Path) -> Result<Self, Condition> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Condition::ConfigurationFile(format!(
                "Unable to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Condition::ConfigurationFile(format!(
                "Unable to parse configuration file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    /// Cache directory with precedence: command line, config file, default.
    pub fn cache_root(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.cache_dir.clone())
            .or_else(|| dirs::config_dir().map(|dir| dir.join(CACHE_DIR)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
