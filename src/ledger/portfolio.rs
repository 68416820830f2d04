use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::category::CategoryCatalog;
use crate::ledger::transaction::Transaction;

/// A rental unit tracked by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Session data shared by the grid: properties, seed transactions and custom categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: CategoryCatalog,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Registers a property by name, returning false when it already exists.
    pub fn add_property(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.property(trimmed).is_some() {
            return false;
        }
        self.properties.push(Property::new(trimmed));
        true
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(|property| property.name.clone())
            .collect()
    }

    /// Appends transactions and registers any property they mention.
    pub fn import_transactions(&mut self, transactions: Vec<Transaction>) -> usize {
        let count = transactions.len();
        for txn in &transactions {
            self.add_property(&txn.property);
        }
        self.transactions.extend(transactions);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::category::CategoryType;

    #[test]
    fn import_registers_properties_once() {
        let mut portfolio = Portfolio::new();
        let imported = portfolio.import_transactions(vec![
            Transaction::new("2024-01-02", CategoryType::Income, "Booking Revenue", 10.0, "Lakeview"),
            Transaction::new("2024-01-03", CategoryType::Expense, "Cleaning", 4.0, "Lakeview"),
            Transaction::new("2024-01-04", CategoryType::Income, "Pet Fees", 2.0, "Harbor"),
        ]);
        assert_eq!(imported, 3);
        assert_eq!(portfolio.property_names(), ["Lakeview", "Harbor"]);
        assert!(!portfolio.add_property("Harbor"));
    }
}
