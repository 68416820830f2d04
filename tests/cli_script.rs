use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rental_ledger_cli").unwrap();
    cmd.env("RENTAL_LEDGER_CLI_SCRIPT", "1")
        .env("RENTAL_LEDGER_HOME", home);
    cmd
}

fn write_transactions(dir: &Path) -> String {
    let path = dir.join("transactions.json");
    fs::write(
        &path,
        r#"[
  {"date": "2024-01-12", "type": "income", "category": "Booking Revenue", "amount": 1200, "property": "Lakeview"},
  {"date": "2024-02-02", "type": "expense", "category": "Mortgage", "amount": 900, "property": "Lakeview"},
  {"date": "2024-01-15", "type": "income", "category": "Booking Revenue", "amount": 800, "property": "Harbor"}
]"#,
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn script_mode_imports_edits_and_exports() {
    let home = TempDir::new().unwrap();
    let exports = TempDir::new().unwrap();
    let transactions = write_transactions(home.path());
    let input = format!(
        "import \"{}\"\n\
         year 2024\n\
         select Lakeview\n\
         set income \"Booking Revenue\" March 500\n\
         set expense Cleaning april \"=100 + 50; ignored\"\n\
         export \"{}\"\n\
         exit\n",
        transactions,
        exports.path().display()
    );

    cli(home.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Imported 3 transactions."))
        .stdout(contains("Saved income Booking Revenue March"))
        .stdout(contains("Saved expense Cleaning April"))
        .stdout(contains("Exported to"));

    let snapshot = fs::read_to_string(home.path().join("snapshots").join("2024.json")).unwrap();
    assert!(snapshot.contains("income-Booking Revenue-March-Lakeview"));
    assert!(snapshot.contains("\"expense-Cleaning-April-Lakeview\": 150.0"));

    let csv = fs::read_to_string(exports.path().join("rental_ledger_2024_Lakeview.csv")).unwrap();
    assert!(csv.starts_with("Type,Category,Jan"));
    assert!(csv.contains("income,Booking Revenue,1200.00,0.00,500.00"));
}

#[test]
fn multi_property_view_rejects_edits() {
    let home = TempDir::new().unwrap();
    let transactions = write_transactions(home.path());
    let input = format!(
        "import \"{}\"\nyear 2024\nselect all\nset income \"Booking Revenue\" May 10\nexit\n",
        transactions
    );

    cli(home.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Read-only view"))
        .stdout(contains("Edit rejected"));

    assert!(!home.path().join("snapshots").join("2024.json").exists());
}

#[test]
fn view_and_categories_persist_between_sessions() {
    let home = TempDir::new().unwrap();
    let transactions = write_transactions(home.path());
    let first = format!(
        "import \"{}\"\n\
         year 2024\n\
         select Harbor\n\
         category add expense \"Snow Removal\"\n\
         set expense \"snow removal\" January =40*2\n\
         category rename expense \"Snow Removal\" \"Snow Plowing\"\n\
         exit\n",
        transactions
    );
    cli(home.path())
        .write_stdin(first)
        .assert()
        .success()
        .stdout(contains("Added expense category `Snow Removal` for Harbor."))
        .stdout(contains("Renamed `Snow Removal` to `Snow Plowing` (1 cells moved)."));

    cli(home.path())
        .write_stdin("year\ncategory list expense\nexit\n")
        .assert()
        .success()
        .stdout(contains("Showing 2024."))
        .stdout(contains("Snow Plowing (custom: Harbor)"));

    let snapshot = fs::read_to_string(home.path().join("snapshots").join("2024.json")).unwrap();
    assert!(snapshot.contains("expense-Snow Plowing-January-Harbor"));
    assert!(!snapshot.contains("Snow Removal"));
}

#[test]
fn unknown_commands_suggest_alternatives() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .write_stdin("shwo\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `shwo`"))
        .stdout(contains("show"));
}
