use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::url::DEFAULT_PORT;

/// Persistent defaults, overridden by command-line flags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeout_secs: u64,
    pub default_port: u16,
    pub replace_existing: bool,
    pub sorted: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            default_port: DEFAULT_PORT,
            replace_existing: true,
            sorted: false,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("devtree");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("devtree");
    }
    PathBuf::from(".devtree")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("devtree.toml")
}

/// Read settings from `path`, or from the default location when `None`.
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (p, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };
    match std::fs::read_to_string(&p) {
        Ok(data) => toml::from_str(&data)
            .with_context(|| format!("Failed to parse settings file {}", p.display())),
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read settings file {}", p.display())),
    }
}
