use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::ledger::category::CategoryType;

/// Recorded income or expense used to seed a year's ledger grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// ISO-8601 date or timestamp, kept as received.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub category: String,
    pub amount: f64,
    pub property: String,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        kind: CategoryType,
        category: impl Into<String>,
        amount: f64,
        property: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            kind,
            category: category.into(),
            amount,
            property: property.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_transaction_date(&self.date)
    }
}

/// Accepts plain dates, RFC 3339 timestamps, and naive ISO timestamps.
pub fn parse_transaction_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|stamp| stamp.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10);
        assert_eq!(parse_transaction_date("2024-03-10"), expected);
        assert_eq!(parse_transaction_date("2024-03-10T08:30:00Z"), expected);
        assert_eq!(parse_transaction_date("2024-03-10T08:30:00.250"), expected);
        assert_eq!(parse_transaction_date("03/10/2024"), None);
        assert_eq!(parse_transaction_date(""), None);
    }

    #[test]
    fn deserializes_type_field() {
        let json = r#"{"date":"2024-03-10","type":"income","category":"Booking Revenue","amount":500,"property":"Lakeview"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.kind, CategoryType::Income);
        assert_eq!(txn.description, "");
    }
}
