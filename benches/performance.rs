use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rental_ledger::core::{FixedClock, LedgerSheet};
use rental_ledger::ledger::{
    formula, CategoryType, CellStore, PropertySelection, Portfolio, Transaction,
    EXPENSE_CATEGORIES, INCOME_CATEGORIES,
};
use rental_ledger::storage::{JsonSnapshotStore, MemorySnapshotStore, SnapshotStore};
use tempfile::tempdir;

const PROPERTIES: [&str; 4] = ["Lakeview", "Harbor", "Cabin", "Loft"];

fn build_sample_portfolio(txn_count: usize) -> Portfolio {
    let mut transactions = Vec::with_capacity(txn_count);
    for idx in 0..txn_count {
        let month = idx % 12 + 1;
        let day = idx % 28 + 1;
        let (kind, category) = if idx % 3 == 0 {
            (CategoryType::Income, INCOME_CATEGORIES[idx % INCOME_CATEGORIES.len()])
        } else {
            (CategoryType::Expense, EXPENSE_CATEGORIES[idx % EXPENSE_CATEGORIES.len()])
        };
        transactions.push(Transaction::new(
            format!("2024-{:02}-{:02}", month, day),
            kind,
            category,
            25.0 + (idx % 100) as f64,
            PROPERTIES[idx % PROPERTIES.len()],
        ));
    }
    let mut portfolio = Portfolio::new();
    portfolio.import_transactions(transactions);
    portfolio
}

fn sample_sheet(selection: PropertySelection) -> LedgerSheet {
    LedgerSheet::open(
        build_sample_portfolio(10_000),
        Box::new(MemorySnapshotStore::new()),
        Box::new(FixedClock::ymd(2025, 1, 1)),
        2024,
        selection,
    )
}

fn bench_formulas(c: &mut Criterion) {
    c.bench_function("formula_nested", |b| {
        b.iter(|| formula::evaluate(black_box("=((1200 + 350.5) * 12 - 80 / 4) * (1 + 0.07)")))
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let sheet = sample_sheet(PropertySelection::new(PROPERTIES));

    c.bench_function("monthly_totals_all_properties", |b| {
        b.iter(|| black_box(sheet.calculate_monthly_totals()))
    });

    c.bench_function("grand_totals_all_properties", |b| {
        b.iter(|| black_box(sheet.calculate_grand_totals()))
    });
}

fn bench_snapshot_io(c: &mut Criterion) {
    let portfolio = build_sample_portfolio(10_000);
    let mut store = CellStore::new(2024);
    store.seed_from_transactions(&portfolio.transactions);
    let snapshot = store.to_snapshot();
    let dir = tempdir().expect("tempdir");
    let backend = JsonSnapshotStore::new(Some(dir.path().to_path_buf()), Some(2)).expect("store");

    c.bench_function("snapshot_save", |b| {
        b.iter(|| backend.save(2024, &snapshot).expect("save snapshot"))
    });

    c.bench_function("snapshot_seed_and_load", |b| {
        b.iter_batched(
            || portfolio.transactions.clone(),
            |transactions| {
                let mut seeded = CellStore::new(2024);
                seeded.seed_from_transactions(&transactions);
                let loaded = CellStore::from_snapshot(2024, &seeded.to_snapshot());
                black_box(loaded);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_formulas, bench_aggregation, bench_snapshot_io);
criterion_main!(benches);
