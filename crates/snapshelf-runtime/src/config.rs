use crate::daemon::DEFAULT_SOCKET;
use crate::probe::DEFAULT_STORE_URL;
use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings from `~/.config/snapshelf/config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShelfConfig {
    pub socket_path: PathBuf,
    pub snap_binary: String,
    pub unsquashfs_binary: String,
    /// Package that must be installed before anything else is installed offline.
    pub support_package: String,
    pub store_probe_url: String,
    pub probe_timeout_secs: u64,
    pub offline_root: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET),
            snap_binary: "snap".to_owned(),
            unsquashfs_binary: "unsquashfs".to_owned(),
            support_package: "snapd".to_owned(),
            store_probe_url: DEFAULT_STORE_URL.to_owned(),
            probe_timeout_secs: 3,
            offline_root: None,
            log_dir: None,
        }
    }
}

impl ShelfConfig {
    /// Load the default config file, or defaults if it does not exist.
    pub fn load_default() -> Result<Self, RuntimeError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RuntimeError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), RuntimeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| RuntimeError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/snapshelf/config.toml"))
}
