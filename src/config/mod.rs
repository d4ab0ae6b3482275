//! Configuration loading and management

mod io;
mod settings;

pub use settings::{DatabaseSettings, GamificationSettings, RetrySettings};

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database file and connection pool
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Transaction retry on lock contention
    #[serde(default)]
    pub retry: RetrySettings,

    /// XP rates, level curve and bonus limits
    #[serde(default)]
    pub gamification: GamificationSettings,
}

impl Config {
    /// Reject settings that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            bail!("database.pool_size must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        self.gamification.engine()?;
        Ok(())
    }

    /// Database file to open: the configured path or the global default
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("motikoc.db"))
    }
}
