use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    errors::LedgerError,
    ledger::{Portfolio, Transaction},
};

const TMP_SUFFIX: &str = "tmp";

/// Writes `value` as pretty JSON by staging to a temporary file and renaming it into place.
pub fn save_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), LedgerError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    write_file(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LedgerError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub fn save_portfolio_to_file(portfolio: &Portfolio, path: &Path) -> Result<(), LedgerError> {
    save_json_atomic(portfolio, path)
}

/// Loads the portfolio, returning an empty one when the file does not exist yet.
pub fn load_portfolio_from_file(path: &Path) -> Result<Portfolio, LedgerError> {
    if !path.exists() {
        return Ok(Portfolio::default());
    }
    load_json(path)
}

/// Reads a JSON array of transactions.
pub fn load_transactions_from_file(path: &Path) -> Result<Vec<Transaction>, LedgerError> {
    load_json(path)
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_file(path: &Path, data: &str) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
