//! Connection pool behavior under exhaustion and concurrent borrowing

mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::create_test_store;
use motikoc::StoreError;

#[test]
fn test_exhausted_pool_times_out() {
    let ts = create_test_store(2);
    let pool = ts.store.pool();

    let a = pool.get().unwrap();
    let b = pool.get().unwrap();
    assert_eq!(pool.idle_count(), 0);

    let err = pool.acquire(Duration::from_millis(50)).err().unwrap();
    assert!(matches!(err, StoreError::PoolTimeout(_)));

    pool.release(a);
    drop(b);
    assert_eq!(pool.idle_count(), 2);
}

#[test]
fn test_waiter_wakes_when_connection_returns() {
    let ts = create_test_store(1);
    let pool = ts.store.pool().clone();
    let held = pool.get().unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || {
            tx.send(()).unwrap();
            let conn = pool.acquire(Duration::from_secs(5)).unwrap();
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0)).unwrap()
        })
    };

    rx.recv().unwrap();
    thread::sleep(Duration::from_millis(50));
    drop(held);

    assert_eq!(waiter.join().unwrap(), 1);
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn test_pragmas_applied_to_every_connection() {
    let ts = create_test_store(3);
    let pool = ts.store.pool();

    let conns: Vec<_> = (0..3).map(|_| pool.get().unwrap()).collect();
    for conn in &conns {
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(fk, 1);
    }
}

#[test]
fn test_zero_sized_pool_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = common::db_config(&dir, 0);
    let err = motikoc::store::ConnectionPool::open(config).err().unwrap();
    assert!(matches!(err, StoreError::Config(_)));
}
