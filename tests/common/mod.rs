#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use once_cell::sync::Lazy;
use rental_ledger::{
    core::{FixedClock, LedgerSheet},
    ledger::{CategoryType, Portfolio, PropertySelection, Transaction},
    storage::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn json_store(retention: usize) -> (JsonSnapshotStore, PathBuf) {
    let base = temp_base();
    let store =
        JsonSnapshotStore::new(Some(base.clone()), Some(retention)).expect("create json store");
    (store, base)
}

/// Two properties with a handful of 2024 transactions and one from 2023.
pub fn sample_portfolio() -> Portfolio {
    let mut portfolio = Portfolio::new();
    portfolio.import_transactions(vec![
        Transaction::new("2024-01-12", CategoryType::Income, "Booking Revenue", 1200.0, "Lakeview"),
        Transaction::new("2024-01-20", CategoryType::Income, "Booking Revenue", 300.0, "Lakeview"),
        Transaction::new("2024-01-21", CategoryType::Expense, "Cleaning", 150.0, "Lakeview"),
        Transaction::new("2024-02-02", CategoryType::Expense, "Mortgage", 900.0, "Lakeview"),
        Transaction::new("2024-01-15", CategoryType::Income, "Booking Revenue", 800.0, "Harbor"),
        Transaction::new("2024-02-15", CategoryType::Expense, "Utilities", 120.0, "Harbor"),
        Transaction::new("2024-11-30T18:00:00Z", CategoryType::Income, "Pet Fees", 50.0, "Harbor"),
        Transaction::new("2023-12-31", CategoryType::Income, "Booking Revenue", 999.0, "Lakeview"),
        Transaction::new("not a date", CategoryType::Expense, "Repairs & Maintenance", 75.0, "Lakeview"),
    ]);
    portfolio
}

pub fn open_sheet(
    portfolio: Portfolio,
    store: Box<dyn SnapshotStore>,
    today: (i32, u32, u32),
    year: i32,
    selection: PropertySelection,
) -> LedgerSheet {
    let (y, m, d) = today;
    LedgerSheet::open(
        portfolio,
        store,
        Box::new(FixedClock::ymd(y, m, d)),
        year,
        selection,
    )
}

/// Sample portfolio over an in-memory store, viewed from the start of 2025.
pub fn memory_sheet(selection: PropertySelection) -> LedgerSheet {
    open_sheet(
        sample_portfolio(),
        Box::new(MemorySnapshotStore::new()),
        (2025, 1, 15),
        2024,
        selection,
    )
}
