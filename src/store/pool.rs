//! Bounded pool of pre-configured SQLite connections
//!
//! Built on `r2d2` with all connections opened eagerly and kept for the life
//! of the pool. A [`PooledConnection`] goes back to the idle list when it is
//! dropped, so every exit path of a caller releases it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};

/// SQLite `synchronous` durability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }

    /// Numeric value reported by `PRAGMA synchronous`
    pub fn level(&self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Normal => 1,
            Self::Full => 2,
            Self::Extra => 3,
        }
    }
}

/// Pool sizing and per-connection settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Database file (must be a file: every connection opens it separately)
    pub path: PathBuf,
    /// Number of connections opened up front (the hard upper bound)
    pub max_size: usize,
    /// Default wait in [`ConnectionPool::get`]
    pub acquire_timeout: Duration,
    /// How long SQLite itself waits on a locked database before returning BUSY
    pub busy_timeout: Duration,
    /// Page cache bound in KiB
    pub cache_size_kib: i64,
    pub synchronous: Synchronous,
}

impl PoolConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
            cache_size_kib: 64_000,
            synchronous: Synchronous::Normal,
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Thread-safe handle to the connection pool.
///
/// Cloning is cheap; all clones share the same connections. Construct one at
/// process start and pass it to whoever needs database access.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Pool<SqliteConnectionManager>,
    config: Arc<PoolConfig>,
}

/// A connection on loan from a [`ConnectionPool`]; dropping it returns it
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

impl ConnectionPool {
    /// Open `config.max_size` connections to `config.path`
    pub fn open(config: PoolConfig) -> StoreResult<Self> {
        let max_size = u32::try_from(config.max_size)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                StoreError::Config("pool size must be between 1 and u32::MAX".to_string())
            })?;

        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let busy_timeout = config.busy_timeout;
        let cache_size_kib = config.cache_size_kib;
        let synchronous = config.synchronous;
        let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
            configure(conn, busy_timeout, cache_size_kib, synchronous)
        });

        // Fixed set: every connection is opened up front and never reaped
        let inner = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(max_size))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(config.acquire_timeout)
            .build(manager)
            .map_err(|source| StoreError::Open {
                path: config.path.clone(),
                source,
            })?;

        info!(
            path = %config.path.display(),
            size = max_size,
            "Opened connection pool"
        );

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Borrow a connection, waiting at most `timeout` for one to become free
    pub fn acquire(&self, timeout: Duration) -> StoreResult<PooledConnection> {
        match self.inner.get_timeout(timeout) {
            Ok(conn) => {
                debug!(idle = self.idle_count(), "Acquired pooled connection");
                Ok(conn)
            }
            Err(e) => {
                warn!(?timeout, "Connection pool timeout: {}", e);
                Err(StoreError::PoolTimeout(timeout))
            }
        }
    }

    /// Borrow a connection with the configured acquire timeout
    pub fn get(&self) -> StoreResult<PooledConnection> {
        self.acquire(self.config.acquire_timeout)
    }

    /// Return a connection to the pool (same as dropping it)
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
    }

    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    /// Connections currently sitting idle in the pool
    pub fn idle_count(&self) -> usize {
        self.inner.state().idle_connections as usize
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

/// Per-connection pragmas, applied once when r2d2 opens a connection
fn configure(
    conn: &mut Connection,
    busy_timeout: Duration,
    cache_size_kib: i64,
    synchronous: Synchronous,
) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Negative cache_size is interpreted by SQLite as KiB
    conn.pragma_update(None, "cache_size", -cache_size_kib)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", synchronous.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_pool(dir: &Path, size: usize) -> ConnectionPool {
        let config = PoolConfig::new(dir.join("pool.db")).with_max_size(size);
        ConnectionPool::open(config).unwrap()
    }

    #[test]
    fn test_connections_are_preconfigured() {
        let dir = tempdir().unwrap();
        let pool = small_pool(dir.path(), 2);
        let conn = pool.get().unwrap();

        let journal: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        let cache: i64 = conn.query_row("PRAGMA cache_size", [], |r| r.get(0)).unwrap();
        let sync: i64 = conn.query_row("PRAGMA synchronous", [], |r| r.get(0)).unwrap();

        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(fk, 1);
        assert_eq!(cache, -64_000);
        assert_eq!(sync, Synchronous::Normal.level());
    }

    #[test]
    fn test_acquire_beyond_capacity_times_out() {
        let dir = tempdir().unwrap();
        let pool = small_pool(dir.path(), 2);

        let a = pool.acquire(Duration::from_millis(10)).unwrap();
        let b = pool.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(pool.idle_count(), 0);

        let err = pool.acquire(Duration::from_millis(50)).err().unwrap();
        assert!(matches!(err, StoreError::PoolTimeout(_)));

        pool.release(a);
        assert_eq!(pool.idle_count(), 1);
        drop(b);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_unopenable_path_fails_within_timeout() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a database file
        let config = PoolConfig::new(dir.path())
            .with_max_size(1)
            .with_acquire_timeout(Duration::from_millis(200));
        assert!(matches!(
            ConnectionPool::open(config),
            Err(StoreError::Open { .. })
        ));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let dir = tempdir().unwrap();
        let config = PoolConfig::new(dir.path().join("zero.db")).with_max_size(0);
        assert!(matches!(
            ConnectionPool::open(config),
            Err(StoreError::Config(_))
        ));
    }
}
