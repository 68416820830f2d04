use serde::Serialize;

use crate::ledger::category::{CategoryCatalog, CategoryType};
use crate::ledger::cell::{finite_or_zero, CellStore};
use crate::ledger::month::{Month, MONTHS_PER_YEAR};
use crate::ledger::selection::PropertySelection;

/// Whether a month's amount is shown and counted. Months after the current
/// one are hidden in the current calendar year only.
pub fn should_show_amount(
    month_index: usize,
    year: i32,
    current_year: i32,
    current_month: usize,
) -> bool {
    if year != current_year {
        return true;
    }
    month_index <= current_month
}

/// Visibility window for a displayed year relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub year: i32,
    pub current_year: i32,
    pub current_month: usize,
}

impl Visibility {
    pub fn new(year: i32, current_year: i32, current_month: usize) -> Self {
        Self {
            year,
            current_year,
            current_month,
        }
    }

    pub fn is_visible(&self, month: Month) -> bool {
        should_show_amount(month.index(), self.year, self.current_year, self.current_month)
    }

    pub fn visible_months(&self) -> impl Iterator<Item = Month> + '_ {
        Month::ALL.into_iter().filter(move |month| self.is_visible(*month))
    }
}

/// Income, expenses and their difference for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

impl Totals {
    pub fn new(income: f64, expenses: f64) -> Self {
        Self {
            income,
            expenses,
            net: income - expenses,
        }
    }

    pub fn add(&mut self, other: &Totals) {
        self.income += other.income;
        self.expenses += other.expenses;
        self.net += other.net;
    }

    pub fn net_class(&self) -> NetClass {
        NetClass::classify(self.net)
    }
}

/// Presentation class of a net amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetClass {
    Favorable,
    Unfavorable,
    Neutral,
}

impl NetClass {
    pub fn classify(net: f64) -> Self {
        if net > 0.0 {
            NetClass::Favorable
        } else if net < 0.0 {
            NetClass::Unfavorable
        } else {
            NetClass::Neutral
        }
    }
}

/// Read-only view that derives every displayed total from a cell store.
pub struct Aggregator<'a> {
    store: &'a CellStore,
    catalog: &'a CategoryCatalog,
    selection: &'a PropertySelection,
    visibility: Visibility,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        store: &'a CellStore,
        catalog: &'a CategoryCatalog,
        selection: &'a PropertySelection,
        visibility: Visibility,
    ) -> Self {
        Self {
            store,
            catalog,
            selection,
            visibility,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Sum of a category over visible months.
    pub fn category_total(&self, category: &str, kind: CategoryType) -> f64 {
        self.visibility
            .visible_months()
            .map(|month| self.store.get(kind, category, month, self.selection))
            .sum()
    }

    fn month_sum(&self, kind: CategoryType, categories: &[String], month: Month) -> f64 {
        categories
            .iter()
            .map(|category| self.store.get(kind, category, month, self.selection))
            .map(finite_or_zero)
            .sum()
    }

    /// Per-month totals indexed 0-11. Hidden months report zero.
    pub fn monthly_totals(&self) -> [Totals; MONTHS_PER_YEAR] {
        let mut totals = [Totals::default(); MONTHS_PER_YEAR];
        let income = self
            .catalog
            .visible_categories(CategoryType::Income, self.selection);
        let expenses = self
            .catalog
            .visible_categories(CategoryType::Expense, self.selection);
        for month in self.visibility.visible_months() {
            totals[month.index()] = Totals::new(
                self.month_sum(CategoryType::Income, &income, month),
                self.month_sum(CategoryType::Expense, &expenses, month),
            );
        }
        totals
    }

    /// Sum of the monthly totals over visible months.
    pub fn grand_totals(&self) -> Totals {
        let monthly = self.monthly_totals();
        let mut grand = Totals::default();
        for month in self.visibility.visible_months() {
            grand.add(&monthly[month.index()]);
        }
        grand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::cell::{CellKey, CellValue};
    use crate::ledger::category::CustomCategory;

    fn store() -> CellStore {
        let mut store = CellStore::new(2024);
        let cells = [
            (CategoryType::Income, "Booking Revenue", Month::January, "Lakeview", 1000.0),
            (CategoryType::Income, "Booking Revenue", Month::July, "Lakeview", 800.0),
            (CategoryType::Expense, "Mortgage", Month::January, "Lakeview", 600.0),
            (CategoryType::Expense, "Hot Tub", Month::January, "Lakeview", 50.0),
            (CategoryType::Expense, "Mortgage", Month::February, "Lakeview", 600.0),
            (CategoryType::Income, "Booking Revenue", Month::January, "Harbor", 300.0),
        ];
        for (kind, category, month, property, amount) in cells {
            store.insert(
                CellKey::new(2024, kind, category, month, property),
                CellValue::plain(amount),
            );
        }
        store
    }

    fn catalog() -> CategoryCatalog {
        let mut catalog = CategoryCatalog::new();
        catalog.push(CustomCategory::new("Hot Tub", CategoryType::Expense, ["Lakeview"]));
        catalog
    }

    #[test]
    fn visibility_rule() {
        assert!(!should_show_amount(6, 2024, 2024, 5));
        assert!(should_show_amount(5, 2024, 2024, 5));
        assert!(should_show_amount(11, 2023, 2024, 5));
        assert!(should_show_amount(11, 2030, 2024, 0));
    }

    #[test]
    fn totals_exclude_hidden_months() {
        let store = store();
        let catalog = catalog();
        let selection = PropertySelection::single("Lakeview");
        let current = Aggregator::new(&store, &catalog, &selection, Visibility::new(2024, 2024, 5));
        assert_eq!(current.category_total("Booking Revenue", CategoryType::Income), 1000.0);
        let monthly = current.monthly_totals();
        assert_eq!(monthly[0], Totals::new(1000.0, 650.0));
        assert_eq!(monthly[1], Totals::new(0.0, 600.0));
        assert_eq!(monthly[6], Totals::default());
        let grand = current.grand_totals();
        assert_eq!(grand, Totals::new(1000.0, 1250.0));
        assert_eq!(grand.net_class(), NetClass::Unfavorable);

        let past = Aggregator::new(&store, &catalog, &selection, Visibility::new(2024, 2025, 0));
        assert_eq!(past.category_total("Booking Revenue", CategoryType::Income), 1800.0);
    }

    #[test]
    fn grand_net_equals_sum_of_visible_monthly_nets() {
        let store = store();
        let catalog = catalog();
        for selection in [
            PropertySelection::single("Lakeview"),
            PropertySelection::new(["Lakeview", "Harbor"]),
            PropertySelection::none(),
        ] {
            for visibility in [Visibility::new(2024, 2024, 3), Visibility::new(2024, 2026, 11)] {
                let aggregator = Aggregator::new(&store, &catalog, &selection, visibility);
                let monthly = aggregator.monthly_totals();
                let expected: f64 = visibility
                    .visible_months()
                    .map(|month| monthly[month.index()].net)
                    .sum();
                assert_eq!(aggregator.grand_totals().net, expected);
            }
        }
    }

    #[test]
    fn custom_rows_only_count_when_visible() {
        let store = store();
        let catalog = catalog();
        let harbor = PropertySelection::single("Harbor");
        let aggregator = Aggregator::new(&store, &catalog, &harbor, Visibility::new(2024, 2025, 0));
        assert_eq!(aggregator.monthly_totals()[0], Totals::new(300.0, 0.0));
    }

    #[test]
    fn net_classification() {
        assert_eq!(NetClass::classify(0.01), NetClass::Favorable);
        assert_eq!(NetClass::classify(-3.0), NetClass::Unfavorable);
        assert_eq!(NetClass::classify(0.0), NetClass::Neutral);
    }
}
