//! Shared test utilities for store and gamification integration tests

#![allow(dead_code)]

use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;

use motikoc::activity::ActivityRecorder;
use motikoc::gamification::{GamificationManager, ProgressionEngine};
use motikoc::store::{PoolConfig, RetryPolicy, Store};

/// A store in a fresh temp directory; the directory lives as long as this value
pub struct TestStore {
    pub dir: TempDir,
    pub store: Store,
}

impl TestStore {
    pub fn recorder(&self) -> ActivityRecorder {
        ActivityRecorder::new(self.store.coordinator().clone())
    }

    pub fn manager(&self) -> GamificationManager {
        GamificationManager::new(self.store.coordinator().clone(), ProgressionEngine::default())
    }

    pub fn register(&self, username: &str) -> i64 {
        self.recorder()
            .register_user(username)
            .expect("Failed to register user")
    }
}

pub fn db_config(dir: &TempDir, pool_size: usize) -> PoolConfig {
    PoolConfig::new(dir.path().join("motikoc.db"))
        .with_max_size(pool_size)
        .with_acquire_timeout(Duration::from_secs(5))
}

/// Creates a temporary database with the schema applied
pub fn create_test_store(pool_size: usize) -> TestStore {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open(db_config(&dir, pool_size), RetryPolicy::default())
        .expect("Failed to open store");
    TestStore { dir, store }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
