//! Ledger grid model: cell keys and values, formulas, categories, totals and navigation.

pub mod aggregation;
pub mod category;
pub mod cell;
pub mod formula;
pub mod month;
pub mod navigation;
pub mod portfolio;
pub mod selection;
pub mod snapshot;
pub mod transaction;

pub use aggregation::{should_show_amount, Aggregator, NetClass, Totals, Visibility};
pub use category::{
    is_builtin, is_custom, CategoryCatalog, CategoryType, CustomCategory, EXPENSE_CATEGORIES,
    INCOME_CATEGORIES,
};
pub use cell::{CellKey, CellStore, CellValue, SeedReport};
pub use month::{Month, MONTHS_PER_YEAR};
pub use navigation::{CellId, EditBuffer, EditKey};
pub use portfolio::{Portfolio, Property};
pub use selection::{PropertySelection, SelectionMode};
pub use snapshot::{StoredSnapshot, YearSnapshot};
pub use transaction::Transaction;
