//! Settings sections of the configuration file

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gamification::{LevelCurve, ProgressionEngine, XpRates, DEFAULT_MAX_BONUS_XP};
use crate::store::{PoolConfig, RetryPolicy, StoreResult, Synchronous};

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file; `~/.motikoc/motikoc.db` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Connections opened up front
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How long a caller waits for a free connection
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// How long SQLite waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: i64,

    #[serde(default)]
    pub synchronous: Synchronous,
}

fn default_pool_size() -> usize {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    30_000
}

fn default_cache_size_kib() -> i64 {
    64_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            cache_size_kib: default_cache_size_kib(),
            synchronous: Synchronous::default(),
        }
    }
}

impl DatabaseSettings {
    /// Pool settings for the database at `path`
    pub fn pool_config(&self, path: PathBuf) -> PoolConfig {
        PoolConfig {
            path,
            max_size: self.pool_size,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            cache_size_kib: self.cache_size_kib,
            synchronous: self.synchronous,
        }
    }
}

/// `[retry]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per transaction, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts).with_backoff(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

/// `[gamification]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationSettings {
    /// Upper bound of one bonus grant
    #[serde(default = "default_max_bonus_xp")]
    pub max_bonus_xp: i64,

    #[serde(default)]
    pub rates: XpRates,

    #[serde(default)]
    pub level_curve: LevelCurve,
}

fn default_max_bonus_xp() -> i64 {
    DEFAULT_MAX_BONUS_XP
}

impl Default for GamificationSettings {
    fn default() -> Self {
        Self {
            max_bonus_xp: default_max_bonus_xp(),
            rates: XpRates::default(),
            level_curve: LevelCurve::default(),
        }
    }
}

impl GamificationSettings {
    pub fn engine(&self) -> StoreResult<ProgressionEngine> {
        ProgressionEngine::new(self.rates.clone(), self.level_curve, self.max_bonus_xp)
    }
}
