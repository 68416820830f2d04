use crate::{
    core::time::Clock,
    currency::format_plain,
    errors::LedgerError,
    ledger::{
        formula,
        navigation::{self, CellId, EditBuffer, EditKey},
        Aggregator, CategoryType, CellStore, Month, Portfolio, PropertySelection, SeedReport,
        Totals, Transaction, Visibility, MONTHS_PER_YEAR,
    },
    storage::SnapshotStore,
};

/// Where the in-memory cells of the current year came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Snapshot,
    Seeded(SeedReport),
}

/// Result of a write-through save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Unchanged,
    /// The in-memory value is kept; only persistence failed.
    Failed(String),
}

impl SaveStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SaveStatus::Failed(_))
    }
}

/// One year of the ledger grid for the current property selection.
///
/// Owns the year's cells, the single edit slot and the injected collaborators.
/// Changing the year or selection discards the cells and reloads them from
/// the snapshot store, seeding from transactions when nothing was saved.
pub struct LedgerSheet {
    portfolio: Portfolio,
    snapshots: Box<dyn SnapshotStore>,
    clock: Box<dyn Clock>,
    year: i32,
    selection: PropertySelection,
    store: CellStore,
    load_source: LoadSource,
    edit: Option<EditBuffer>,
}

impl LedgerSheet {
    /// Opens the current calendar year with nothing selected.
    pub fn new(
        portfolio: Portfolio,
        snapshots: Box<dyn SnapshotStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let (year, _) = clock.current_period();
        Self::open(portfolio, snapshots, clock, year, PropertySelection::none())
    }

    pub fn open(
        portfolio: Portfolio,
        snapshots: Box<dyn SnapshotStore>,
        clock: Box<dyn Clock>,
        year: i32,
        selection: PropertySelection,
    ) -> Self {
        let mut sheet = Self {
            portfolio,
            snapshots,
            clock,
            year,
            selection,
            store: CellStore::new(year),
            load_source: LoadSource::Seeded(SeedReport::default()),
            edit: None,
        };
        sheet.reload();
        sheet
    }

    fn reload(&mut self) {
        self.edit = None;
        match self.snapshots.load(self.year) {
            Ok(Some(snapshot)) => {
                self.store = CellStore::from_snapshot(self.year, &snapshot);
                self.load_source = LoadSource::Snapshot;
                tracing::debug!(year = self.year, cells = self.store.len(), "loaded snapshot");
            }
            Ok(None) => self.seed(),
            Err(err) => {
                tracing::error!(year = self.year, error = %err, "failed to load snapshot; seeding from transactions");
                self.seed();
            }
        }
    }

    fn seed(&mut self) {
        let mut store = CellStore::new(self.year);
        let report = store.seed_from_transactions(&self.portfolio.transactions);
        self.store = store;
        self.load_source = LoadSource::Seeded(report);
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn selection(&self) -> &PropertySelection {
        &self.selection
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn snapshots(&self) -> &dyn SnapshotStore {
        self.snapshots.as_ref()
    }

    pub fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    pub(crate) fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    pub(crate) fn store_mut(&mut self) -> &mut CellStore {
        &mut self.store
    }

    pub fn set_year(&mut self, year: i32) {
        if year != self.year {
            self.year = year;
            self.reload();
        }
    }

    pub fn set_selection(&mut self, selection: PropertySelection) {
        if selection != self.selection {
            self.selection = selection;
            self.reload();
        }
    }

    /// Adds transactions to the portfolio. A year that was seeded (not loaded
    /// from a snapshot) is re-seeded so the new rows show up.
    pub fn import_transactions(&mut self, transactions: Vec<Transaction>) -> usize {
        let count = self.portfolio.import_transactions(transactions);
        if matches!(self.load_source, LoadSource::Seeded(_)) {
            self.seed();
        }
        count
    }

    /// Discards saved edits for the year and re-seeds from transactions.
    pub fn reset(&mut self) -> Result<SeedReport, LedgerError> {
        self.edit = None;
        self.snapshots.delete(self.year)?;
        self.seed();
        match &self.load_source {
            LoadSource::Seeded(report) => Ok(report.clone()),
            LoadSource::Snapshot => Ok(SeedReport::default()),
        }
    }

    pub fn can_edit(&self) -> bool {
        self.selection.can_edit()
    }

    pub fn visibility(&self) -> Visibility {
        let (current_year, current_month) = self.clock.current_period();
        Visibility::new(self.year, current_year, current_month)
    }

    pub fn visible_categories(&self, kind: CategoryType) -> Vec<String> {
        self.portfolio
            .categories
            .visible_categories(kind, &self.selection)
    }

    pub fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(
            &self.store,
            &self.portfolio.categories,
            &self.selection,
            self.visibility(),
        )
    }

    pub fn get_cell_value(&self, kind: CategoryType, category: &str, month: Month) -> f64 {
        self.store.get(kind, category, month, &self.selection)
    }

    pub fn get_cell_formula(&self, kind: CategoryType, category: &str, month: Month) -> Option<String> {
        self.store
            .get_formula(kind, category, month, &self.selection)
            .map(str::to_string)
    }

    pub fn calculate_category_total(&self, category: &str, kind: CategoryType) -> f64 {
        self.aggregator().category_total(category, kind)
    }

    pub fn calculate_monthly_totals(&self) -> [Totals; MONTHS_PER_YEAR] {
        self.aggregator().monthly_totals()
    }

    pub fn calculate_grand_totals(&self) -> Totals {
        self.aggregator().grand_totals()
    }

    fn check_editable(&self, kind: CategoryType, category: &str, month: Month) -> Result<&str, LedgerError> {
        let property = self.selection.single_property().ok_or_else(|| {
            LedgerError::EditRejected(
                "editing is only available when exactly one property is selected".into(),
            )
        })?;
        if !self.visibility().is_visible(month) {
            return Err(LedgerError::EditRejected(format!(
                "{} {} has not happened yet",
                month, self.year
            )));
        }
        if !self.visible_categories(kind).iter().any(|name| name == category) {
            return Err(LedgerError::EditRejected(format!(
                "{} category `{}` is not shown for {}",
                kind, category, property
            )));
        }
        Ok(property)
    }

    /// Single write path for cell values. A `=` formula is evaluated here and
    /// its result replaces `value`. The whole year is saved synchronously
    /// after the in-memory write succeeds.
    pub fn handle_cell_update(
        &mut self,
        kind: CategoryType,
        category: &str,
        month: Month,
        value: f64,
        year: i32,
        formula: Option<&str>,
    ) -> Result<SaveStatus, LedgerError> {
        if year != self.year {
            return Err(LedgerError::EditRejected(format!(
                "year {} is not the loaded year {}",
                year, self.year
            )));
        }
        let property = self.check_editable(kind, category, month)?.to_string();
        let (value, formula) = match formula.map(str::trim).filter(|text| formula::is_formula(text)) {
            Some(text) => (formula::evaluate(text), Some(text.to_string())),
            None => (value, None),
        };
        self.store.set(
            kind,
            category,
            month,
            &property,
            value,
            formula,
            &self.selection,
        )?;
        Ok(self.persist())
    }

    /// Commits raw user input: `=expr` is stored as a formula with its
    /// evaluated amount, anything else as a plain number.
    pub fn commit_input(
        &mut self,
        kind: CategoryType,
        category: &str,
        month: Month,
        input: &str,
    ) -> Result<SaveStatus, LedgerError> {
        let trimmed = input.trim();
        let value = formula::evaluate(trimmed);
        let formula_text = formula::is_formula(trimmed).then_some(trimmed);
        self.handle_cell_update(kind, category, month, value, self.year, formula_text)
    }

    /// Saves the loaded year. Once saved the year counts as a snapshot, so
    /// later imports no longer re-seed it.
    pub(crate) fn persist(&mut self) -> SaveStatus {
        match self.snapshots.save(self.year, &self.store.to_snapshot()) {
            Ok(()) => {
                self.load_source = LoadSource::Snapshot;
                SaveStatus::Saved
            }
            Err(err) => {
                tracing::error!(year = self.year, error = %err, "failed to save ledger snapshot");
                SaveStatus::Failed(err.to_string())
            }
        }
    }

    pub fn traversal_order(&self) -> Vec<CellId> {
        navigation::traversal_order(&self.portfolio.categories, &self.selection, &self.visibility())
    }

    pub fn active_cell(&self) -> Option<&CellId> {
        self.edit.as_ref().map(|buffer| &buffer.cell)
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit.as_ref()
    }

    /// Focuses a cell for editing. Any edit already in progress is committed first.
    pub fn begin_edit(&mut self, cell: CellId) -> Result<SaveStatus, LedgerError> {
        self.check_editable(cell.kind, &cell.category, cell.month)?;
        let status = self.commit_edit()?;
        let original = match self.get_cell_formula(cell.kind, &cell.category, cell.month) {
            Some(text) => text,
            None => {
                let property = self.selection.single_property().unwrap_or_default();
                self.store
                    .cell(cell.kind, &cell.category, cell.month, property)
                    .map(|value| format_plain(value.amount))
                    .unwrap_or_default()
            }
        };
        tracing::debug!(cell = %cell, "editing cell");
        self.edit = Some(EditBuffer::new(cell, original));
        Ok(status)
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> Result<(), LedgerError> {
        let buffer = self
            .edit
            .as_mut()
            .ok_or_else(|| LedgerError::EditRejected("no cell is being edited".into()))?;
        buffer.draft = text.into();
        Ok(())
    }

    /// Writes the draft of the active cell and clears focus. A rejected
    /// write leaves the buffer and focus in place.
    pub fn commit_edit(&mut self) -> Result<SaveStatus, LedgerError> {
        let Some(buffer) = self.edit.take() else {
            return Ok(SaveStatus::Unchanged);
        };
        if !buffer.is_dirty() {
            return Ok(SaveStatus::Unchanged);
        }
        let cell = &buffer.cell;
        match self.commit_input(cell.kind, &cell.category, cell.month, &buffer.draft) {
            Ok(status) => Ok(status),
            Err(err) => {
                self.edit = Some(buffer);
                Err(err)
            }
        }
    }

    /// Drops the draft without writing; the committed value is untouched.
    pub fn cancel_edit(&mut self) -> Option<EditBuffer> {
        self.edit.take()
    }

    pub fn handle_key(&mut self, key: EditKey) -> Result<SaveStatus, LedgerError> {
        match key {
            EditKey::Enter => self.commit_edit(),
            EditKey::Escape => {
                self.cancel_edit();
                Ok(SaveStatus::Unchanged)
            }
            EditKey::Tab | EditKey::ShiftTab => {
                if !self.can_edit() {
                    return Err(LedgerError::EditRejected(
                        "editing is only available when exactly one property is selected".into(),
                    ));
                }
                let current = self.active_cell().cloned();
                let status = self.commit_edit()?;
                let order = self.traversal_order();
                let target = match key {
                    EditKey::Tab => navigation::next_cell(&order, current.as_ref()),
                    _ => navigation::previous_cell(&order, current.as_ref()),
                };
                if let Some(target) = target.cloned() {
                    self.begin_edit(target)?;
                }
                Ok(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::time::FixedClock, ledger::CustomCategory, storage::MemorySnapshotStore};

    #[test]
    fn failed_tab_commit_keeps_the_draft_and_focus() {
        let mut portfolio = Portfolio::new();
        portfolio.import_transactions(vec![Transaction::new(
            "2024-02-03",
            CategoryType::Expense,
            "Dock",
            60.0,
            "Lakeview",
        )]);
        let dock = CustomCategory::new("Dock", CategoryType::Expense, ["Lakeview"]);
        let id = dock.id;
        portfolio.categories.push(dock);
        let mut sheet = LedgerSheet::open(
            portfolio,
            Box::new(MemorySnapshotStore::new()),
            Box::new(FixedClock::ymd(2024, 6, 15)),
            2024,
            PropertySelection::single("Lakeview"),
        );
        let cell = CellId::new(CategoryType::Expense, "Dock", Month::February);
        sheet.begin_edit(cell.clone()).unwrap();
        sheet.update_draft("75").unwrap();

        sheet.portfolio_mut().categories.remove(id);
        let err = sheet.handle_key(EditKey::Tab).unwrap_err();
        assert!(err.is_rejection());
        let buffer = sheet.edit_buffer().unwrap();
        assert_eq!(buffer.cell, cell);
        assert_eq!(buffer.draft, "75");
        assert!(sheet.handle_key(EditKey::Enter).is_err());
        assert_eq!(sheet.active_cell(), Some(&cell));
        assert_eq!(sheet.get_cell_value(CategoryType::Expense, "Dock", Month::February), 60.0);
    }
}
