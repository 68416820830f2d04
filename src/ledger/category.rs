use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::selection::PropertySelection;

pub const INCOME_CATEGORIES: &[&str] = &[
    "Booking Revenue",
    "Cleaning Fees",
    "Pet Fees",
    "Late Fees",
    "Other Income",
];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Mortgage",
    "Property Tax",
    "Insurance",
    "Utilities",
    "Repairs & Maintenance",
    "Cleaning",
    "Supplies",
    "Management Fees",
    "Platform Fees",
    "Other Expenses",
];

/// Direction of money flow for a ledger row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub const ALL: [CategoryType; 2] = [CategoryType::Income, CategoryType::Expense];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }

    /// Canonical built-in rows, in display order.
    pub fn builtin_categories(self) -> &'static [&'static str] {
        match self {
            CategoryType::Income => INCOME_CATEGORIES,
            CategoryType::Expense => EXPENSE_CATEGORIES,
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = LedgerError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" | "expenses" => Ok(CategoryType::Expense),
            other => Err(LedgerError::InvalidRef(format!(
                "unknown category type `{}`",
                other
            ))),
        }
    }
}

pub fn is_builtin(name: &str, kind: CategoryType) -> bool {
    kind.builtin_categories().contains(&name)
}

/// Name-only test; cell contents are never consulted.
pub fn is_custom(name: &str, kind: CategoryType) -> bool {
    !is_builtin(name, kind)
}

/// User-defined ledger row scoped to a set of properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomCategory {
    pub id: Uuid,
    pub name: String,
    pub kind: CategoryType,
    pub properties: Vec<String>,
}

impl CustomCategory {
    pub fn new<I, S>(name: impl Into<String>, kind: CategoryType, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn applies_to(&self, property: &str) -> bool {
        self.properties.iter().any(|name| name == property)
    }
}

/// Custom categories per type, kept in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryCatalog {
    #[serde(default)]
    income: Vec<CustomCategory>,
    #[serde(default)]
    expense: Vec<CustomCategory>,
}

impl CategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom(&self, kind: CategoryType) -> &[CustomCategory] {
        match kind {
            CategoryType::Income => &self.income,
            CategoryType::Expense => &self.expense,
        }
    }

    pub(crate) fn custom_mut(&mut self, kind: CategoryType) -> &mut Vec<CustomCategory> {
        match kind {
            CategoryType::Income => &mut self.income,
            CategoryType::Expense => &mut self.expense,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&CustomCategory> {
        self.income
            .iter()
            .chain(self.expense.iter())
            .find(|category| category.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut CustomCategory> {
        self.income
            .iter_mut()
            .chain(self.expense.iter_mut())
            .find(|category| category.id == id)
    }

    /// Case-insensitive lookup of a custom category that applies to `property`.
    pub fn find_for_property(
        &self,
        kind: CategoryType,
        name: &str,
        property: &str,
    ) -> Option<&CustomCategory> {
        let normalized = normalize(name);
        self.custom(kind)
            .iter()
            .find(|category| normalize(&category.name) == normalized && category.applies_to(property))
    }

    pub fn find_by_name(&self, kind: CategoryType, name: &str) -> Option<&CustomCategory> {
        let normalized = normalize(name);
        self.custom(kind)
            .iter()
            .find(|category| normalize(&category.name) == normalized)
    }

    pub(crate) fn push(&mut self, category: CustomCategory) {
        self.custom_mut(category.kind).push(category);
    }

    pub(crate) fn remove(&mut self, id: Uuid) -> Option<CustomCategory> {
        for kind in CategoryType::ALL {
            let list = self.custom_mut(kind);
            if let Some(position) = list.iter().position(|category| category.id == id) {
                return Some(list.remove(position));
            }
        }
        None
    }

    /// Rows shown for `kind` under `selection`: built-ins first, then custom
    /// categories of the selected properties in first-encounter order.
    pub fn visible_categories(&self, kind: CategoryType, selection: &PropertySelection) -> Vec<String> {
        let mut names: Vec<String> = kind
            .builtin_categories()
            .iter()
            .map(|name| name.to_string())
            .collect();
        for property in selection.iter() {
            for category in self.custom(kind).iter().filter(|c| c.applies_to(property)) {
                if is_builtin(&category.name, kind) || names.contains(&category.name) {
                    continue;
                }
                names.push(category.name.clone());
            }
        }
        names
    }
}

pub(crate) fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CategoryCatalog {
        let mut catalog = CategoryCatalog::new();
        catalog.push(CustomCategory::new("Hot Tub", CategoryType::Expense, ["Lakeview"]));
        catalog.push(CustomCategory::new("Snow Removal", CategoryType::Expense, ["Harbor"]));
        catalog.push(CustomCategory::new("Boat Rental", CategoryType::Income, ["Lakeview", "Harbor"]));
        catalog.push(CustomCategory::new("Pool Service", CategoryType::Expense, ["Lakeview", "Harbor"]));
        catalog.push(CustomCategory::new("Cleaning", CategoryType::Expense, ["Lakeview"]));
        catalog
    }

    #[test]
    fn builtins_come_first_in_canonical_order() {
        let names = catalog().visible_categories(CategoryType::Expense, &PropertySelection::none());
        assert_eq!(names, EXPENSE_CATEGORIES);
    }

    #[test]
    fn single_property_appends_its_customs_in_insertion_order() {
        let names = catalog().visible_categories(
            CategoryType::Expense,
            &PropertySelection::single("Lakeview"),
        );
        let customs = &names[EXPENSE_CATEGORIES.len()..];
        assert_eq!(customs, ["Hot Tub", "Pool Service"]);
    }

    #[test]
    fn multiple_properties_union_without_duplicates() {
        let names = catalog().visible_categories(
            CategoryType::Expense,
            &PropertySelection::new(["Harbor", "Lakeview"]),
        );
        let customs = &names[EXPENSE_CATEGORIES.len()..];
        assert_eq!(customs, ["Snow Removal", "Pool Service", "Hot Tub"]);
    }

    #[test]
    fn custom_test_is_name_based() {
        assert!(!is_custom("Mortgage", CategoryType::Expense));
        assert!(is_custom("Mortgage", CategoryType::Income));
        assert!(is_custom("Hot Tub", CategoryType::Expense));
    }

    #[test]
    fn parses_category_type() {
        assert_eq!("Income".parse::<CategoryType>().unwrap(), CategoryType::Income);
        assert_eq!("expenses".parse::<CategoryType>().unwrap(), CategoryType::Expense);
        assert!("transfer".parse::<CategoryType>().is_err());
    }
}
