//! Transaction coordinator: acquire, run, commit or roll back, release, retry
//!
//! Every read or write of application rows goes through
//! [`TransactionCoordinator`]. The body closure may run more than once, so it
//! must not have side effects outside the transaction it is given.

use std::ops::Deref;
use std::thread;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, error, warn};

use super::error::{StoreError, StoreResult};
use super::pool::ConnectionPool;
use super::retry::RetryPolicy;

/// One attempt of a transaction on a pooled connection.
///
/// Dereferences to the underlying [`Connection`] so record helpers and
/// queries can run against it directly.
pub struct TransactionScope<'c> {
    tx: Transaction<'c>,
    attempt: u32,
}

impl TransactionScope<'_> {
    /// 1-based attempt number of this scope
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Deref for TransactionScope<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

/// Runs closures inside retried transactions on connections from the pool
#[derive(Clone)]
pub struct TransactionCoordinator {
    pool: ConnectionPool,
    policy: RetryPolicy,
}

impl TransactionCoordinator {
    pub fn new(pool: ConnectionPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `body` in a write transaction with the default retry policy
    pub fn with_transaction<T, F>(&self, body: F) -> StoreResult<T>
    where
        F: FnMut(&TransactionScope<'_>) -> StoreResult<T>,
    {
        self.run(self.policy, TransactionBehavior::Immediate, body)
    }

    /// Run `body` in a write transaction, attempting it at most `retries` times
    pub fn with_transaction_retries<T, F>(&self, retries: u32, body: F) -> StoreResult<T>
    where
        F: FnMut(&TransactionScope<'_>) -> StoreResult<T>,
    {
        let policy = RetryPolicy {
            max_attempts: retries.max(1),
            ..self.policy
        };
        self.run(policy, TransactionBehavior::Immediate, body)
    }

    /// Run a read-only `body`; the write lock is never requested
    pub fn with_read_transaction<T, F>(&self, body: F) -> StoreResult<T>
    where
        F: FnMut(&TransactionScope<'_>) -> StoreResult<T>,
    {
        self.run(self.policy, TransactionBehavior::Deferred, body)
    }

    fn run<T, F>(
        &self,
        policy: RetryPolicy,
        behavior: TransactionBehavior,
        mut body: F,
    ) -> StoreResult<T>
    where
        F: FnMut(&TransactionScope<'_>) -> StoreResult<T>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt_once(behavior, attempt, &mut body) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < policy.max_attempts && policy.is_retryable(&e) => {
                    let delay = policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        ?delay,
                        "Database locked, retrying transaction"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(e) => return Err(into_failure(e, attempt)),
            }
        }
    }

    fn attempt_once<T, F>(
        &self,
        behavior: TransactionBehavior,
        attempt: u32,
        body: &mut F,
    ) -> StoreResult<T>
    where
        F: FnMut(&TransactionScope<'_>) -> StoreResult<T>,
    {
        // Released back to the pool when this function returns, on every path
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(behavior)?;
        let scope = TransactionScope { tx, attempt };

        match body(&scope) {
            Ok(value) => {
                scope.tx.commit()?;
                debug!(attempt, "Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = scope.tx.rollback() {
                    warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Raw SQLite errors leave the coordinator as `TransactionFailed`; typed
/// domain errors pass through untouched.
fn into_failure(err: StoreError, attempts: u32) -> StoreError {
    match err {
        StoreError::Sqlite(source) => {
            error!(attempts, "Transaction failed: {}", source);
            StoreError::TransactionFailed { attempts, source }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::pool::PoolConfig;
    use rusqlite::ffi;
    use tempfile::tempdir;

    fn coordinator(dir: &std::path::Path) -> TransactionCoordinator {
        let pool =
            ConnectionPool::open(PoolConfig::new(dir.join("tx.db")).with_max_size(2)).unwrap();
        let coordinator = TransactionCoordinator::new(pool, RetryPolicy::immediate(3));
        coordinator
            .with_transaction(|tx| {
                tx.execute_batch("CREATE TABLE IF NOT EXISTS t (v INTEGER NOT NULL)")?;
                Ok(())
            })
            .unwrap();
        coordinator
    }

    fn busy() -> StoreError {
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None))
    }

    fn count(c: &TransactionCoordinator) -> i64 {
        c.with_read_transaction(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let dir = tempdir().unwrap();
        let c = coordinator(dir.path());
        c.with_transaction(|tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&c), 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let dir = tempdir().unwrap();
        let c = coordinator(dir.path());
        let result: StoreResult<()> = c.with_transaction(|tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(StoreError::InvalidAmount(0))
        });
        assert!(matches!(result, Err(StoreError::InvalidAmount(0))));
        assert_eq!(count(&c), 0);
        assert_eq!(c.pool().idle_count(), 2);
    }

    #[test]
    fn test_contention_is_retried_from_the_start() {
        let dir = tempdir().unwrap();
        let c = coordinator(dir.path());
        let mut calls = 0;
        let attempt = c
            .with_transaction(|tx| {
                calls += 1;
                tx.execute("INSERT INTO t (v) VALUES (?1)", [calls])?;
                if tx.attempt() < 3 { Err(busy()) } else { Ok(tx.attempt()) }
            })
            .unwrap();
        assert_eq!(attempt, 3);
        assert_eq!(calls, 3);
        // Failed attempts were rolled back
        assert_eq!(count(&c), 1);
    }

    #[test]
    fn test_exhausted_retries_fail() {
        let dir = tempdir().unwrap();
        let c = coordinator(dir.path());
        let mut calls = 0;
        let result: StoreResult<()> = c.with_transaction_retries(4, |_| {
            calls += 1;
            Err(busy())
        });
        match result {
            Err(StoreError::TransactionFailed { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected TransactionFailed, got {:?}", other.err()),
        }
        assert_eq!(calls, 4);
        assert_eq!(c.pool().idle_count(), 2);
    }

    #[test]
    fn test_non_retryable_sqlite_error_fails_once() {
        let dir = tempdir().unwrap();
        let c = coordinator(dir.path());
        let mut calls = 0;
        let result: StoreResult<()> = c.with_transaction(|tx| {
            calls += 1;
            tx.execute("INSERT INTO missing_table (v) VALUES (1)", [])?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::TransactionFailed { attempts: 1, .. })));
        assert_eq!(calls, 1);
    }
}
