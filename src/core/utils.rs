use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::LedgerError;

const DEFAULT_DIR_NAME: &str = ".rental_ledger";
const SNAPSHOT_DIR: &str = "snapshots";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";
const PORTFOLIO_FILE: &str = "portfolio.json";
const EXPORT_DIR: &str = "exports";

/// Returns the application-specific data directory, defaulting to `~/.rental_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("RENTAL_LEDGER_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Resolves the on-disk layout beneath a base directory.
pub struct PathResolver;

impl PathResolver {
    pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
        custom.unwrap_or_else(app_data_dir)
    }

    pub fn snapshot_dir_in(base: &Path) -> PathBuf {
        base.join(SNAPSHOT_DIR)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    pub fn portfolio_file_in(base: &Path) -> PathBuf {
        base.join(PORTFOLIO_FILE)
    }

    pub fn export_dir_in(base: &Path) -> PathBuf {
        base.join(EXPORT_DIR)
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), LedgerError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
