use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde_json::Value;

use crate::{
    errors::LedgerError,
    ledger::{StoredSnapshot, YearSnapshot},
};

use super::{Result, SnapshotStore};

/// In-process store holding raw JSON documents per year.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    years: RwLock<BTreeMap<i32, Value>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a year with an arbitrary document, e.g. a legacy flat value map.
    pub fn insert_raw(&self, year: i32, document: Value) -> Result<()> {
        self.write()?.insert(year, document);
        Ok(())
    }

    pub fn raw(&self, year: i32) -> Result<Option<Value>> {
        Ok(self.read()?.get(&year).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<i32, Value>>> {
        self.years
            .read()
            .map_err(|_| LedgerError::Persistence("snapshot store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<i32, Value>>> {
        self.years
            .write()
            .map_err(|_| LedgerError::Persistence("snapshot store lock poisoned".into()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, year: i32) -> Result<Option<YearSnapshot>> {
        let Some(document) = self.raw(year)? else {
            return Ok(None);
        };
        let stored: StoredSnapshot = serde_json::from_value(document)?;
        if stored.is_legacy() {
            tracing::warn!(year, "migrating legacy flat snapshot");
        }
        Ok(Some(stored.into_snapshot()))
    }

    fn save(&self, year: i32, snapshot: &YearSnapshot) -> Result<()> {
        let document = serde_json::to_value(snapshot)?;
        self.write()?.insert(year, document);
        Ok(())
    }

    fn years(&self) -> Result<Vec<i32>> {
        Ok(self.read()?.keys().copied().collect())
    }

    fn delete(&self, year: i32) -> Result<()> {
        self.write()?.remove(&year);
        Ok(())
    }
}
