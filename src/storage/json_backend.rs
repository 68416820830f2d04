use chrono::{NaiveDateTime, Utc};
use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, PathResolver},
    errors::LedgerError,
    ledger::{StoredSnapshot, YearSnapshot},
    utils::persistence::{tmp_path, write_file},
};

use super::{Result, SnapshotStore};

const SNAPSHOT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Describes one backup file for a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub year: i32,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
    pub path: PathBuf,
}

/// Filesystem store writing one `<year>.json` per year, with rolling backups.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    root: PathBuf,
    snapshots_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonSnapshotStore {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = PathResolver::resolve_base(root);
        ensure_dir(&root)?;
        let snapshots_dir = PathResolver::snapshot_dir_in(&root);
        let backups_dir = PathResolver::backup_dir_in(&root);
        ensure_dir(&snapshots_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root,
            snapshots_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, year: i32) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}.{}", year, SNAPSHOT_EXTENSION))
    }

    fn backup_dir(&self, year: i32) -> PathBuf {
        self.backups_dir.join(year.to_string())
    }

    /// Backups for `year`, newest first.
    pub fn list_backups(&self, year: i32) -> Result<Vec<BackupInfo>> {
        let dir = self.backup_dir(year);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            entries.push(BackupInfo {
                year,
                name: name.to_string(),
                created_at: parse_backup_timestamp(name),
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.name.clone())));
        Ok(entries)
    }

    /// Replaces the live snapshot of `year` with the named backup and returns it.
    pub fn restore_backup(&self, year: i32, name: &str) -> Result<YearSnapshot> {
        let path = self.backup_dir(year).join(name);
        if !path.exists() {
            return Err(LedgerError::Persistence(format!(
                "backup `{}` for {} not found",
                name, year
            )));
        }
        let snapshot = read_snapshot(&path, year)?;
        self.save(year, &snapshot)?;
        Ok(snapshot)
    }

    fn backup_existing_file(&self, year: i32, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(year);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_path = dir.join(format!("{}_{}.{}", year, timestamp, SNAPSHOT_EXTENSION));
        fs::copy(path, &backup_path)?;
        self.prune_backups(year)
    }

    fn prune_backups(&self, year: i32) -> Result<()> {
        for entry in self.list_backups(year)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(path = %entry.path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self, year: i32) -> Result<Option<YearSnapshot>> {
        let path = self.snapshot_path(year);
        if !path.exists() {
            return Ok(None);
        }
        read_snapshot(&path, year).map(Some)
    }

    fn save(&self, year: i32, snapshot: &YearSnapshot) -> Result<()> {
        let path = self.snapshot_path(year);
        self.backup_existing_file(year, &path)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = tmp_path(&path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(year, path = %path.display(), "snapshot saved");
        Ok(())
    }

    fn years(&self) -> Result<Vec<i32>> {
        if !self.snapshots_dir.exists() {
            return Ok(Vec::new());
        }
        let mut years = Vec::new();
        for entry in fs::read_dir(&self.snapshots_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(year) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i32>().ok())
            {
                years.push(year);
            }
        }
        years.sort_unstable();
        Ok(years)
    }

    fn delete(&self, year: i32) -> Result<()> {
        let path = self.snapshot_path(year);
        if path.exists() {
            self.backup_existing_file(year, &path)?;
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn read_snapshot(path: &Path, year: i32) -> Result<YearSnapshot> {
    let data = fs::read_to_string(path)?;
    let stored: StoredSnapshot = serde_json::from_str(&data)?;
    if stored.is_legacy() {
        tracing::warn!(year, path = %path.display(), "migrating legacy flat snapshot");
    }
    Ok(stored.into_snapshot())
}

fn parse_backup_timestamp(name: &str) -> Option<NaiveDateTime> {
    let stem = name.strip_suffix(&format!(".{}", SNAPSHOT_EXTENSION))?;
    let (_, stamp) = stem.split_once('_')?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backup_names() {
        let parsed = parse_backup_timestamp("2024_20240310_081500.json").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-10 08:15:00");
        assert_eq!(parse_backup_timestamp("2024.json"), None);
    }
}
