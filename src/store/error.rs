//! Error type shared by the pool, the transaction coordinator and everything
//! that runs inside a transaction scope.

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::ErrorCode;

/// Errors surfaced by the store and the gamification layer on top of it
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No database connection available within {0:?}")]
    PoolTimeout(Duration),

    #[error("Transaction failed after {attempts} attempt(s): {source}")]
    TransactionFailed {
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid XP amount: {0} (must be positive)")]
    InvalidAmount(i64),

    #[error("Column '{column}' is not writable on table '{table}'")]
    InvalidField {
        table: &'static str,
        column: &'static str,
    },

    #[error("Refusing to {0} without fields or filter")]
    EmptyStatement(&'static str),

    #[error("Failed to open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: r2d2::Error,
    },

    #[error("Failed to prepare database directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// True when the store was transiently locked by another writer
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Self::Sqlite(e) | Self::TransactionFailed { source: e, .. } => is_busy(e),
            _ => false,
        }
    }

    /// True for a UNIQUE / PRIMARY KEY violation
    pub(crate) fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
                    && matches!(
                        e.extended_code,
                        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    )
            }
            _ => false,
        }
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == ErrorCode::DatabaseBusy || f.code == ErrorCode::DatabaseLocked
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_busy_and_locked_are_contention() {
        let busy = StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ));
        let locked = StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_LOCKED),
            Some("database table is locked".to_string()),
        ));
        assert!(busy.is_lock_contention());
        assert!(locked.is_lock_contention());
        assert!(!StoreError::InvalidAmount(0).is_lock_contention());
    }

    #[test]
    fn test_unique_violation_detection() {
        let dup = StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            None,
        ));
        let fk = StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            None,
        ));
        assert!(dup.is_unique_violation());
        assert!(!fk.is_unique_violation());
    }
}
