use uuid::Uuid;

use crate::{
    core::ledger_sheet::{LedgerSheet, SaveStatus},
    errors::LedgerError,
    ledger::{
        category::normalize, is_builtin, CategoryType, CellStore, CustomCategory,
    },
};

use super::{ServiceError, ServiceResult};

pub struct CategoryService;

impl CategoryService {
    /// Registers a custom category for one or more properties.
    pub fn add(
        sheet: &mut LedgerSheet,
        name: &str,
        kind: CategoryType,
        properties: &[String],
    ) -> ServiceResult<Uuid> {
        let name = Self::validate_name(sheet, None, name, kind, properties)?;
        let properties = Self::validate_properties(sheet, properties)?;
        let category = CustomCategory::new(name, kind, properties);
        let id = category.id;
        tracing::info!(category = %category.name, kind = %kind, "custom category added");
        sheet.portfolio_mut().categories.push(category);
        Ok(id)
    }

    /// Renames a custom category. Stored cells of every year and the matching
    /// transactions follow the new name. Returns the number of cells moved.
    pub fn rename(sheet: &mut LedgerSheet, id: Uuid, new_name: &str) -> ServiceResult<usize> {
        let existing = Self::find(sheet, id)?.clone();
        let new_name = Self::validate_name(
            sheet,
            Some(id),
            new_name,
            existing.kind,
            &existing.properties,
        )?;
        if new_name == existing.name {
            return Ok(0);
        }
        sheet.cancel_edit();
        let kind = existing.kind;
        let old = existing.name.as_str();
        let properties = existing.properties.as_slice();
        let moved = Self::rewrite_stored_years(sheet, |store| {
            store.rename_category(kind, old, &new_name, properties)
        })?;

        let portfolio = sheet.portfolio_mut();
        for transaction in portfolio.transactions.iter_mut().filter(|txn| {
            txn.kind == kind && txn.category == old && properties.contains(&txn.property)
        }) {
            transaction.category = new_name.clone();
        }
        if let Some(category) = portfolio.categories.get_mut(id) {
            category.name = new_name.clone();
        }
        tracing::info!(from = %old, to = %new_name, moved, "custom category renamed");
        Ok(moved)
    }

    /// Changes which properties a custom category applies to. Cells of
    /// properties that are dropped stay stored but are no longer shown.
    pub fn set_properties(
        sheet: &mut LedgerSheet,
        id: Uuid,
        properties: &[String],
    ) -> ServiceResult<()> {
        let existing = Self::find(sheet, id)?.clone();
        Self::validate_name(sheet, Some(id), &existing.name, existing.kind, properties)?;
        let properties = Self::validate_properties(sheet, properties)?;
        sheet.cancel_edit();
        if let Some(category) = sheet.portfolio_mut().categories.get_mut(id) {
            category.properties = properties;
        }
        Ok(())
    }

    /// Removes the category from the catalog. Its stored values are kept.
    pub fn delete(sheet: &mut LedgerSheet, id: Uuid) -> ServiceResult<CustomCategory> {
        Self::find(sheet, id)?;
        sheet.cancel_edit();
        let removed = sheet
            .portfolio_mut()
            .categories
            .remove(id)
            .ok_or_else(|| ServiceError::Invalid("Category not found".into()))?;
        tracing::info!(category = %removed.name, "custom category deleted");
        Ok(removed)
    }

    /// Deletes the category and drops its stored cells in every year.
    pub fn purge(sheet: &mut LedgerSheet, id: Uuid) -> ServiceResult<usize> {
        let existing = Self::find(sheet, id)?.clone();
        sheet.cancel_edit();
        let removed = Self::rewrite_stored_years(sheet, |store| {
            store.remove_category(existing.kind, &existing.name, &existing.properties)
        })?;
        sheet.portfolio_mut().categories.remove(id);
        tracing::info!(category = %existing.name, removed, "custom category purged");
        Ok(removed)
    }

    pub fn list(sheet: &LedgerSheet, kind: CategoryType) -> Vec<&CustomCategory> {
        sheet.portfolio().categories.custom(kind).iter().collect()
    }

    /// Resolves a custom category by case-insensitive name.
    pub fn find_by_name(
        sheet: &LedgerSheet,
        kind: CategoryType,
        name: &str,
    ) -> ServiceResult<Uuid> {
        sheet
            .portfolio()
            .categories
            .find_by_name(kind, name)
            .map(|category| category.id)
            .ok_or_else(|| ServiceError::Invalid(format!("Custom {} category `{}` not found", kind, name)))
    }

    fn find(sheet: &LedgerSheet, id: Uuid) -> ServiceResult<&CustomCategory> {
        sheet
            .portfolio()
            .categories
            .get(id)
            .ok_or_else(|| ServiceError::Invalid("Category not found".into()))
    }

    fn validate_name(
        sheet: &LedgerSheet,
        exclude: Option<Uuid>,
        candidate: &str,
        kind: CategoryType,
        properties: &[String],
    ) -> ServiceResult<String> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::Invalid("Category name cannot be empty".into()));
        }
        if is_builtin(trimmed, kind) {
            return Err(ServiceError::Invalid(format!(
                "`{}` is a built-in {} category",
                trimmed, kind
            )));
        }
        let normalized = normalize(trimmed);
        let duplicate = sheet.portfolio().categories.custom(kind).iter().any(|category| {
            normalize(&category.name) == normalized
                && exclude.map_or(true, |id| category.id != id)
                && properties.iter().any(|property| category.applies_to(property.trim()))
        });
        if duplicate {
            Err(ServiceError::Invalid(format!(
                "Category `{}` already exists",
                trimmed
            )))
        } else {
            Ok(trimmed.to_string())
        }
    }

    fn validate_properties(sheet: &LedgerSheet, properties: &[String]) -> ServiceResult<Vec<String>> {
        let mut resolved: Vec<String> = Vec::new();
        for property in properties.iter().map(|name| name.trim()) {
            if sheet.portfolio().property(property).is_none() {
                return Err(ServiceError::Invalid(format!(
                    "Property `{}` not found",
                    property
                )));
            }
            if !resolved.iter().any(|name| name == property) {
                resolved.push(property.to_string());
            }
        }
        if resolved.is_empty() {
            return Err(ServiceError::Invalid(
                "A custom category needs at least one property".into(),
            ));
        }
        Ok(resolved)
    }

    /// Applies `apply` to every stored year and the loaded one. Other years
    /// are all rewritten in memory before any of them is saved.
    fn rewrite_stored_years<F>(sheet: &mut LedgerSheet, apply: F) -> ServiceResult<usize>
    where
        F: Fn(&mut CellStore) -> usize,
    {
        let current = sheet.year();
        let mut pending = Vec::new();
        for year in sheet.snapshots().years()? {
            if year == current {
                continue;
            }
            let Some(snapshot) = sheet.snapshots().load(year)? else {
                continue;
            };
            let mut store = CellStore::from_snapshot(year, &snapshot);
            let changed = apply(&mut store);
            if changed > 0 {
                pending.push((year, store.to_snapshot(), changed));
            }
        }

        let mut total = 0;
        for (year, snapshot, changed) in pending {
            sheet.snapshots().save(year, &snapshot)?;
            total += changed;
        }

        let changed = apply(sheet.store_mut());
        if changed > 0 {
            if let SaveStatus::Failed(message) = sheet.persist() {
                return Err(LedgerError::Persistence(message).into());
            }
            total += changed;
        }
        Ok(total)
    }
}
