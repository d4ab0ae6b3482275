//! Shared transactional data access
//!
//! One SQLite file, a bounded pool of connections to it and a coordinator
//! that runs every logical operation in its own retried transaction.
//!
//! # Usage
//!
//! ```ignore
//! let store = Store::open(PoolConfig::new("motikoc.db"), RetryPolicy::default())?;
//!
//! let level = store.coordinator().with_transaction(|tx| {
//!     engine.grant_xp(tx, user_id, 150)
//! })?;
//! ```

mod error;
pub mod pool;
pub mod records;
mod retry;
pub mod schema;
mod transaction;

pub use error::{StoreError, StoreResult};
pub use pool::{ConnectionPool, PoolConfig, PooledConnection, Synchronous};
pub use records::{Column, FromRow, Table};
pub use retry::RetryPolicy;
pub use transaction::{TransactionCoordinator, TransactionScope};

use tracing::info;

/// Pool plus coordinator over an initialized database
#[derive(Clone)]
pub struct Store {
    coordinator: TransactionCoordinator,
}

impl Store {
    /// Open the pool and bring the schema up to date
    pub fn open(config: PoolConfig, policy: RetryPolicy) -> StoreResult<Self> {
        let pool = ConnectionPool::open(config)?;
        let coordinator = TransactionCoordinator::new(pool, policy);
        coordinator.with_transaction(|tx| schema::initialize(tx))?;
        info!(
            path = %coordinator.pool().path().display(),
            "Database ready"
        );
        Ok(Self { coordinator })
    }

    pub fn coordinator(&self) -> &TransactionCoordinator {
        &self.coordinator
    }

    pub fn pool(&self) -> &ConnectionPool {
        self.coordinator.pool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_initializes_schema() {
        let dir = tempdir().unwrap();
        let store = Store::open(
            PoolConfig::new(dir.path().join("store.db")).with_max_size(2),
            RetryPolicy::default(),
        )
        .unwrap();

        let version = store
            .coordinator()
            .with_read_transaction(|tx| schema::schema_version(tx))
            .unwrap();
        assert_eq!(version, schema::SCHEMA_VERSION);
        assert_eq!(store.pool().idle_count(), 2);
    }
}
