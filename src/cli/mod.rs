//! CLI command implementations

pub mod badges;
pub mod init;
pub mod leaderboard;
pub mod user;
pub mod xp;

use anyhow::{Context, Result};
use std::path::PathBuf;

use motikoc::activity::ActivityRecorder;
use motikoc::gamification::GamificationManager;
use motikoc::models::User;
use motikoc::{Config, Store};

/// Global flags shared by every command
pub struct Options {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
}

impl Options {
    pub fn load_config(&self) -> Result<Config> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let mut config = Config::load(self.config.as_deref(), &cwd)?;
        if let Some(db) = &self.db {
            config.database.path = Some(db.clone());
        }
        Ok(config)
    }
}

/// Everything a command needs once the database is open
pub struct Session {
    pub config: Config,
    pub store: Store,
}

impl Session {
    pub fn open(options: &Options) -> Result<Self> {
        let config = options.load_config()?;
        let path = config.database_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let store = Store::open(config.database.pool_config(path.clone()), config.retry.policy())
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Ok(Self { config, store })
    }

    pub fn recorder(&self) -> ActivityRecorder {
        ActivityRecorder::new(self.store.coordinator().clone())
    }

    pub fn manager(&self) -> Result<GamificationManager> {
        Ok(GamificationManager::new(
            self.store.coordinator().clone(),
            self.config.gamification.engine()?,
        ))
    }

    /// Look up a registered user by name
    pub fn user(&self, username: &str) -> Result<User> {
        self.recorder()
            .find_user(username)?
            .with_context(|| format!("Unknown user: {username}"))
    }
}
