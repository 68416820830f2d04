use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Persisted form of one year's ledger cells, keyed by storage cell id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct YearSnapshot {
    pub values: BTreeMap<String, f64>,
    #[serde(default)]
    pub formulas: BTreeMap<String, String>,
}

impl YearSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.formulas.is_empty()
    }

    /// Parses either the current wrapped layout or a legacy flat value map.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let stored: StoredSnapshot = serde_json::from_str(data)?;
        Ok(stored.into_snapshot())
    }
}

/// On-disk shapes a snapshot may take.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredSnapshot {
    Current(YearSnapshot),
    /// Older saves wrote the value map directly, without formulas.
    Legacy(BTreeMap<String, f64>),
}

impl StoredSnapshot {
    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredSnapshot::Legacy(_))
    }

    pub fn into_snapshot(self) -> YearSnapshot {
        match self {
            StoredSnapshot::Current(snapshot) => snapshot,
            StoredSnapshot::Legacy(values) => YearSnapshot {
                values,
                formulas: BTreeMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_mapping_migrates_to_wrapped_form() {
        let raw = r#"{"income-Booking Revenue-March-Lakeview": 500.0}"#;
        let stored: StoredSnapshot = serde_json::from_str(raw).unwrap();
        assert!(stored.is_legacy());
        let snapshot = stored.into_snapshot();
        assert_eq!(snapshot.values.get("income-Booking Revenue-March-Lakeview"), Some(&500.0));
        assert!(snapshot.formulas.is_empty());
    }

    #[test]
    fn wrapped_form_keeps_formulas() {
        let raw = r#"{"values":{"a":1.0},"formulas":{"a":"=1"}}"#;
        let snapshot = YearSnapshot::from_json(raw).unwrap();
        assert_eq!(snapshot.formulas.get("a").map(String::as_str), Some("=1"));
    }

    #[test]
    fn empty_object_is_an_empty_legacy_map() {
        let snapshot = YearSnapshot::from_json("{}").unwrap();
        assert!(snapshot.is_empty());
    }
}
