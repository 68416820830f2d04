mod common;

use std::fs;

use common::{json_store, memory_sheet, open_sheet, sample_portfolio, temp_base};
use rental_ledger::{
    core::{services::CategoryService, LoadSource},
    ledger::{CategoryType, Month, PropertySelection, YearSnapshot},
    storage::{JsonSnapshotStore, SnapshotStore},
    utils::persistence::{load_portfolio_from_file, load_transactions_from_file, save_portfolio_to_file},
};

fn snapshot_with(id: &str, value: f64, formula: Option<&str>) -> YearSnapshot {
    let mut snapshot = YearSnapshot::new();
    snapshot.values.insert(id.to_string(), value);
    if let Some(formula) = formula {
        snapshot.formulas.insert(id.to_string(), formula.to_string());
    }
    snapshot
}

#[test]
fn snapshots_round_trip_through_disk() {
    let (store, base) = json_store(3);
    let snapshot = snapshot_with("income-Booking Revenue-March-Lakeview", 600.0, Some("=500+100"));
    store.save(2024, &snapshot).unwrap();

    assert!(base.join("snapshots").join("2024.json").exists());
    assert!(!base.join("snapshots").join("2024.json.tmp").exists());
    assert_eq!(store.load(2024).unwrap(), Some(snapshot));
    assert_eq!(store.load(2023).unwrap(), None);
    assert_eq!(store.years().unwrap(), vec![2024]);
}

#[test]
fn legacy_flat_file_loads_as_values() {
    let (store, _) = json_store(3);
    fs::write(
        store.snapshot_path(2022),
        r#"{"expense-Mortgage-January-Lakeview": 1250.0}"#,
    )
    .unwrap();

    let loaded = store.load(2022).unwrap().unwrap();
    assert_eq!(loaded.values.get("expense-Mortgage-January-Lakeview"), Some(&1250.0));
    assert!(loaded.formulas.is_empty());
}

#[test]
fn overwrites_keep_a_restorable_backup() {
    let (store, _) = json_store(2);
    let first = snapshot_with("expense-Cleaning-January-Lakeview", 150.0, None);
    let second = snapshot_with("expense-Cleaning-January-Lakeview", 175.0, None);
    store.save(2024, &first).unwrap();
    assert!(store.list_backups(2024).unwrap().is_empty());

    store.save(2024, &second).unwrap();
    let backups = store.list_backups(2024).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].name.starts_with("2024_"));
    assert!(backups[0].created_at.is_some());

    let restored = store.restore_backup(2024, &backups[0].name).unwrap();
    assert_eq!(restored, first);
    assert_eq!(store.load(2024).unwrap(), Some(first));
    assert!(store.restore_backup(2024, "missing.json").is_err());
}

#[test]
fn backups_are_pruned_to_retention() {
    let (store, _) = json_store(1);
    for value in [1.0, 2.0, 3.0, 4.0] {
        store
            .save(2024, &snapshot_with("income-Pet Fees-May-Harbor", value, None))
            .unwrap();
    }
    assert_eq!(store.list_backups(2024).unwrap().len(), 1);
}

#[test]
fn delete_removes_the_year_but_backs_it_up() {
    let (store, _) = json_store(3);
    store
        .save(2023, &snapshot_with("income-Late Fees-June-Harbor", 35.0, None))
        .unwrap();
    store.delete(2023).unwrap();
    assert_eq!(store.load(2023).unwrap(), None);
    assert!(store.years().unwrap().is_empty());
    assert_eq!(store.list_backups(2023).unwrap().len(), 1);
    // Deleting a missing year is a no-op.
    store.delete(2023).unwrap();
}

#[test]
fn sheet_edits_are_written_through_to_disk() {
    let base = temp_base();
    let store = JsonSnapshotStore::new(Some(base.clone()), None).unwrap();
    let mut sheet = open_sheet(
        sample_portfolio(),
        Box::new(store),
        (2025, 1, 15),
        2024,
        PropertySelection::single("Lakeview"),
    );
    sheet
        .commit_input(CategoryType::Expense, "Property Tax", Month::April, "=1200/4")
        .unwrap();

    let reopened = JsonSnapshotStore::new(Some(base), None).unwrap();
    let snapshot = reopened.load(2024).unwrap().unwrap();
    assert_eq!(
        snapshot.values.get("expense-Property Tax-April-Lakeview"),
        Some(&300.0)
    );
    assert_eq!(
        snapshot
            .formulas
            .get("expense-Property Tax-April-Lakeview")
            .map(String::as_str),
        Some("=1200/4")
    );
    // Seeded cells of other properties are part of the year snapshot.
    assert_eq!(
        snapshot.values.get("income-Booking Revenue-January-Harbor"),
        Some(&800.0)
    );
}

#[test]
fn unreadable_snapshot_falls_back_to_seeding() {
    let (store, _) = json_store(3);
    fs::write(store.snapshot_path(2024), "{ not json").unwrap();
    let sheet = open_sheet(
        sample_portfolio(),
        Box::new(store),
        (2025, 1, 15),
        2024,
        PropertySelection::single("Lakeview"),
    );
    assert!(matches!(sheet.load_source(), LoadSource::Seeded(_)));
    assert_eq!(
        sheet.get_cell_value(CategoryType::Expense, "Cleaning", Month::January),
        150.0
    );
}

#[test]
fn portfolio_round_trips_with_custom_categories() {
    let base = temp_base();
    let path = base.join("portfolio.json");
    assert!(load_portfolio_from_file(&path).unwrap().properties.is_empty());

    let mut sheet = memory_sheet(PropertySelection::single("Lakeview"));
    CategoryService::add(
        &mut sheet,
        "Boat Rental",
        CategoryType::Income,
        &["Lakeview".to_string()],
    )
    .unwrap();
    save_portfolio_to_file(sheet.portfolio(), &path).unwrap();

    let loaded = load_portfolio_from_file(&path).unwrap();
    assert_eq!(&loaded, sheet.portfolio());
    assert!(loaded
        .categories
        .find_for_property(CategoryType::Income, "boat rental", "Lakeview")
        .is_some());
}

#[test]
fn transactions_load_from_json_with_type_field() {
    let base = temp_base();
    let path = base.join("transactions.json");
    fs::write(
        &path,
        r#"[{"date": "2024-03-10", "type": "income", "category": "Booking Revenue",
             "amount": 500, "property": "Lakeview"}]"#,
    )
    .unwrap();
    let transactions = load_transactions_from_file(&path).unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, CategoryType::Income);
    assert_eq!(transactions[0].description, "");
}
