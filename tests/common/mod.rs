#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use ledger_tree::{
    core::{FixedClock, LedgerManager},
    storage::JsonStorage,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Keeps TempDir guards alive until the test binary exits.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn scratch_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// A manager over a fresh JSON store, stamping transactions at a fixed time.
pub fn setup_test_env() -> (LedgerManager, JsonStorage) {
    let base = scratch_dir();
    let storage = JsonStorage::in_dir(&base, Some(3)).expect("create json storage backend");
    let manager =
        LedgerManager::with_clock(Box::new(storage.clone()), Box::new(FixedClock(at(12, 0))))
            .expect("open ledger manager");
    (manager, storage)
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
