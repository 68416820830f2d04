use std::{collections::BTreeMap, fmt};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::ledger::category::CategoryType;
use crate::ledger::month::Month;
use crate::ledger::selection::PropertySelection;
use crate::ledger::snapshot::YearSnapshot;
use crate::ledger::transaction::Transaction;

/// Address of one ledger cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub year: i32,
    pub kind: CategoryType,
    pub category: String,
    pub month: Month,
    pub property: String,
}

impl CellKey {
    pub fn new(
        year: i32,
        kind: CategoryType,
        category: impl Into<String>,
        month: Month,
        property: impl Into<String>,
    ) -> Self {
        Self {
            year,
            kind,
            category: category.into(),
            month,
            property: property.into(),
        }
    }

    /// Year-local id used in persisted snapshots: `{type}-{category}-{Month}-{property}`.
    /// Dashes and `%` inside the category and property are percent-escaped so
    /// the id always has exactly four segments.
    pub fn storage_id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.kind,
            escape_segment(&self.category),
            self.month,
            escape_segment(&self.property)
        )
    }

    /// Parses a snapshot id. Ids with four segments are read field by field;
    /// older ids with raw dashes split at the leftmost `-{Month}-`.
    pub fn parse_storage_id(year: i32, id: &str) -> Option<Self> {
        let (kind, rest) = id.split_once('-')?;
        let kind: CategoryType = kind.parse().ok()?;
        if let [category, month, property] = rest.split('-').collect::<Vec<_>>()[..] {
            let month = Month::ALL.iter().find(|candidate| candidate.name() == month);
            if let Some(month) = month {
                if category.is_empty() || property.is_empty() {
                    return None;
                }
                return Some(Self::new(
                    year,
                    kind,
                    unescape_segment(category),
                    *month,
                    unescape_segment(property),
                ));
            }
        }
        let (position, month, needle_len) = Month::ALL
            .iter()
            .filter_map(|month| {
                let needle = format!("-{}-", month.name());
                rest.find(&needle).map(|pos| (pos, *month, needle.len()))
            })
            .min_by_key(|(pos, _, _)| *pos)?;
        let category = &rest[..position];
        let property = &rest[position + needle_len..];
        if category.is_empty() || property.is_empty() {
            return None;
        }
        Some(Self::new(year, kind, category, month, property))
    }
}

fn escape_segment(raw: &str) -> String {
    raw.replace('%', "%25").replace('-', "%2D")
}

fn unescape_segment(encoded: &str) -> String {
    encoded.replace("%2D", "-").replace("%25", "%")
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.storage_id())
    }
}

/// Committed cell content. When a formula is present the amount is its last
/// evaluated result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl CellValue {
    pub fn plain(amount: f64) -> Self {
        Self {
            amount,
            formula: None,
        }
    }

    pub fn with_formula(amount: f64, formula: impl Into<String>) -> Self {
        Self {
            amount,
            formula: Some(formula.into()),
        }
    }
}

/// Outcome of seeding a store from transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub applied: usize,
    pub other_years: usize,
    pub invalid_dates: usize,
}

/// Cells for a single year across every property.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStore {
    year: i32,
    cells: BTreeMap<CellKey, CellValue>,
}

impl CellStore {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            cells: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CellValue)> {
        self.cells.iter()
    }

    fn key(&self, kind: CategoryType, category: &str, month: Month, property: &str) -> CellKey {
        CellKey::new(self.year, kind, category, month, property)
    }

    pub fn cell(
        &self,
        kind: CategoryType,
        category: &str,
        month: Month,
        property: &str,
    ) -> Option<&CellValue> {
        self.cells.get(&self.key(kind, category, month, property))
    }

    /// Amount shown for a grid position: the single property's value, or the
    /// sum over every selected property. Absent cells read as zero.
    pub fn get(
        &self,
        kind: CategoryType,
        category: &str,
        month: Month,
        selection: &PropertySelection,
    ) -> f64 {
        selection
            .iter()
            .filter_map(|property| self.cell(kind, category, month, property))
            .fold(0.0, |total, cell| total + finite_or_zero(cell.amount))
    }

    /// Formulas are only exposed in single-property mode.
    pub fn get_formula(
        &self,
        kind: CategoryType,
        category: &str,
        month: Month,
        selection: &PropertySelection,
    ) -> Option<&str> {
        let property = selection.single_property()?;
        self.cell(kind, category, month, property)?
            .formula
            .as_deref()
    }

    /// Writes a cell for `property`. Rejected unless exactly that one property is selected.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        kind: CategoryType,
        category: &str,
        month: Month,
        property: &str,
        value: f64,
        formula: Option<String>,
        selection: &PropertySelection,
    ) -> Result<(), LedgerError> {
        match selection.single_property() {
            Some(selected) if selected == property => {}
            Some(selected) => {
                return Err(LedgerError::EditRejected(format!(
                    "property `{}` is not the selected property `{}`",
                    property, selected
                )))
            }
            None => {
                return Err(LedgerError::EditRejected(
                    "select exactly one property to edit values".into(),
                ))
            }
        }
        let key = self.key(kind, category, month, property);
        tracing::debug!(cell = %key, value, formula = ?formula, "cell updated");
        self.cells.insert(
            key,
            CellValue {
                amount: finite_or_zero(value),
                formula: formula.filter(|text| !text.trim().is_empty()),
            },
        );
        Ok(())
    }

    pub(crate) fn insert(&mut self, key: CellKey, value: CellValue) {
        self.cells.insert(key, value);
    }

    /// Replaces the store contents with the transactions dated in this year,
    /// summing amounts that land on the same cell.
    pub fn seed_from_transactions(&mut self, transactions: &[Transaction]) -> SeedReport {
        self.cells.clear();
        let mut report = SeedReport::default();
        for txn in transactions {
            let Some(date) = txn.parsed_date() else {
                tracing::warn!(
                    date = %txn.date,
                    category = %txn.category,
                    property = %txn.property,
                    "skipping transaction with invalid date"
                );
                report.invalid_dates += 1;
                continue;
            };
            if date.year() != self.year {
                report.other_years += 1;
                continue;
            }
            let Some(month) = Month::from_number(date.month()) else {
                report.invalid_dates += 1;
                continue;
            };
            let key = self.key(txn.kind, &txn.category, month, &txn.property);
            self.cells.entry(key).or_default().amount += finite_or_zero(txn.amount);
            report.applied += 1;
        }
        tracing::debug!(year = self.year, applied = report.applied, "seeded ledger cells");
        report
    }

    pub fn to_snapshot(&self) -> YearSnapshot {
        let mut snapshot = YearSnapshot::new();
        for (key, value) in &self.cells {
            let id = key.storage_id();
            if let Some(formula) = &value.formula {
                snapshot.formulas.insert(id.clone(), formula.clone());
            }
            snapshot.values.insert(id, value.amount);
        }
        snapshot
    }

    /// Rebuilds a store from a snapshot; unreadable ids are skipped.
    pub fn from_snapshot(year: i32, snapshot: &YearSnapshot) -> Self {
        let mut store = Self::new(year);
        for (id, amount) in &snapshot.values {
            match CellKey::parse_storage_id(year, id) {
                Some(key) => {
                    let formula = snapshot.formulas.get(id).cloned();
                    store.insert(
                        key,
                        CellValue {
                            amount: finite_or_zero(*amount),
                            formula,
                        },
                    );
                }
                None => tracing::warn!(year, id = %id, "ignoring unreadable snapshot cell id"),
            }
        }
        store
    }

    /// Moves every cell of `old` to `new` for the given properties. Returns the number moved.
    /// A cell landing on an occupied one is merged into a plain sum; neither formula survives.
    pub fn rename_category(
        &mut self,
        kind: CategoryType,
        old: &str,
        new: &str,
        properties: &[String],
    ) -> usize {
        let moved: Vec<CellKey> = self
            .cells
            .keys()
            .filter(|key| key.kind == kind && key.category == old && properties.contains(&key.property))
            .cloned()
            .collect();
        for key in &moved {
            if let Some(value) = self.cells.remove(key) {
                let mut renamed = key.clone();
                renamed.category = new.to_string();
                match self.cells.get_mut(&renamed) {
                    Some(existing) => {
                        *existing = CellValue::plain(existing.amount + value.amount);
                    }
                    None => {
                        self.cells.insert(renamed, value);
                    }
                }
            }
        }
        moved.len()
    }

    /// Drops every cell of a category for the given properties.
    pub fn remove_category(&mut self, kind: CategoryType, name: &str, properties: &[String]) -> usize {
        let before = self.cells.len();
        self.cells.retain(|key, _| {
            !(key.kind == kind && key.category == name && properties.contains(&key.property))
        });
        before - self.cells.len()
    }
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
