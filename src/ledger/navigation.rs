use std::fmt;

use crate::ledger::aggregation::Visibility;
use crate::ledger::category::{CategoryCatalog, CategoryType};
use crate::ledger::formula;
use crate::ledger::month::Month;
use crate::ledger::selection::PropertySelection;

/// Grid position independent of property: `{type}-{category}-{Month}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellId {
    pub kind: CategoryType,
    pub category: String,
    pub month: Month,
}

impl CellId {
    pub fn new(kind: CategoryType, category: impl Into<String>, month: Month) -> Self {
        Self {
            kind,
            category: category.into(),
            month,
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.kind, self.category, self.month)
    }
}

/// Keys the grid reacts to while a cell is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
    Tab,
    ShiftTab,
}

/// The single in-progress edit. Merged into the store only on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub cell: CellId,
    pub draft: String,
    original: String,
}

impl EditBuffer {
    pub fn new(cell: CellId, original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            cell,
            draft: original.clone(),
            original,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_formula(&self) -> bool {
        formula::is_formula(&self.draft)
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.trim() != self.original.trim()
    }
}

/// Editable cells in tab order: income rows then expense rows, each row
/// walking its visible months.
pub fn traversal_order(
    catalog: &CategoryCatalog,
    selection: &PropertySelection,
    visibility: &Visibility,
) -> Vec<CellId> {
    let mut order = Vec::new();
    for kind in CategoryType::ALL {
        for category in catalog.visible_categories(kind, selection) {
            for month in visibility.visible_months() {
                order.push(CellId::new(kind, category.clone(), month));
            }
        }
    }
    order
}

/// Next cell after `current`, wrapping to the first. Unknown cells start at the top.
pub fn next_cell<'a>(order: &'a [CellId], current: Option<&CellId>) -> Option<&'a CellId> {
    if order.is_empty() {
        return None;
    }
    let index = current
        .and_then(|cell| order.iter().position(|candidate| candidate == cell))
        .map(|index| (index + 1) % order.len())
        .unwrap_or(0);
    order.get(index)
}

/// Previous cell before `current`, wrapping to the last.
pub fn previous_cell<'a>(order: &'a [CellId], current: Option<&CellId>) -> Option<&'a CellId> {
    if order.is_empty() {
        return None;
    }
    let len = order.len();
    let index = current
        .and_then(|cell| order.iter().position(|candidate| candidate == cell))
        .map(|index| index.checked_sub(1).unwrap_or(len - 1))
        .unwrap_or(len - 1);
    order.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::category::{EXPENSE_CATEGORIES, INCOME_CATEGORIES};

    fn cells() -> Vec<CellId> {
        vec![
            CellId::new(CategoryType::Income, "A", Month::January),
            CellId::new(CategoryType::Income, "B", Month::January),
            CellId::new(CategoryType::Income, "C", Month::January),
        ]
    }

    #[test]
    fn tab_wraps_forward_and_backward() {
        let order = cells();
        assert_eq!(next_cell(&order, Some(&order[2])), Some(&order[0]));
        assert_eq!(previous_cell(&order, Some(&order[0])), Some(&order[2]));
        assert_eq!(next_cell(&order, Some(&order[0])), Some(&order[1]));
        assert_eq!(previous_cell(&order, Some(&order[2])), Some(&order[1]));
    }

    #[test]
    fn unknown_or_missing_focus_starts_at_edges() {
        let order = cells();
        let stray = CellId::new(CategoryType::Expense, "Z", Month::May);
        assert_eq!(next_cell(&order, Some(&stray)), Some(&order[0]));
        assert_eq!(next_cell(&order, None), Some(&order[0]));
        assert_eq!(previous_cell(&order, None), Some(&order[2]));
        assert_eq!(next_cell(&[], None), None);
    }

    #[test]
    fn order_lists_income_before_expense_and_skips_hidden_months() {
        let catalog = CategoryCatalog::new();
        let selection = PropertySelection::single("Lakeview");
        let visibility = Visibility::new(2024, 2024, 1);
        let order = traversal_order(&catalog, &selection, &visibility);
        assert_eq!(order.len(), (INCOME_CATEGORIES.len() + EXPENSE_CATEGORIES.len()) * 2);
        assert_eq!(order[0].to_string(), "income-Booking Revenue-January");
        assert_eq!(order[1].to_string(), "income-Booking Revenue-February");
        assert_eq!(order[2].to_string(), "income-Cleaning Fees-January");
        assert_eq!(order[INCOME_CATEGORIES.len() * 2].kind, CategoryType::Expense);
    }

    #[test]
    fn buffer_tracks_formula_and_changes() {
        let mut buffer = EditBuffer::new(cells()[0].clone(), "=1+1");
        assert!(buffer.is_formula());
        assert!(!buffer.is_dirty());
        buffer.draft = "25".into();
        assert!(!buffer.is_formula());
        assert!(buffer.is_dirty());
    }
}
