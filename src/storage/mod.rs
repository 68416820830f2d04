pub mod json_backend;
pub mod memory;

use crate::{errors::LedgerError, ledger::YearSnapshot};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Persistence boundary for per-year ledger snapshots.
///
/// Saves are synchronous: the grid does not report an edit as saved until
/// `save` has returned.
pub trait SnapshotStore: Send + Sync {
    /// Returns `None` when nothing has been saved for `year`.
    fn load(&self, year: i32) -> Result<Option<YearSnapshot>>;
    fn save(&self, year: i32, snapshot: &YearSnapshot) -> Result<()>;
    /// Years with a saved snapshot, ascending.
    fn years(&self) -> Result<Vec<i32>>;
    fn delete(&self, year: i32) -> Result<()>;
}

pub use json_backend::{BackupInfo, JsonSnapshotStore};
pub use memory::MemorySnapshotStore;
