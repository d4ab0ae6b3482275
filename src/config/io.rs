//! Configuration file I/O operations

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.motikoc/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".motikoc")
    }

    /// Get the global config file path (~/.motikoc/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Project-local config file (`<dir>/.motikoc/config.toml`)
    pub fn local_config_path(dir: &Path) -> PathBuf {
        dir.join(".motikoc").join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve and load the configuration.
    ///
    /// Order: `explicit` path, `.motikoc/config.toml` under `dir`, the global
    /// `~/.motikoc/config.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        Self::load_from(&[Self::local_config_path(dir), Self::global_config_path()])
    }

    /// First existing file of `candidates`, or defaults
    pub(crate) fn load_from(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            if path.exists() {
                debug!(path = %path.display(), "Loading config");
                return Self::from_file(path);
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file with atomic write and file locking.
    ///
    /// An exclusive lock on a sidecar file keeps concurrent writers apart and
    /// the content goes through a temp file plus rename.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        let lock_path = path.with_extension("toml.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire config lock")?;

        let temp_path = path.with_extension("toml.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .with_context(|| "Failed to write config content")?;

        temp_file
            .sync_all()
            .with_context(|| "Failed to sync config file")?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

        // Lock is released when lock_file is dropped
        Ok(())
    }
}
