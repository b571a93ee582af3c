use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar date format used on the wire and in sheets
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One cell of a record table
///
/// Serialized untagged: JSON numbers become `Number`, `YYYY-MM-DD` strings
/// become `Date`, every other string is `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

/// One row: column name -> value
pub type Record = BTreeMap<String, Value>;

/// Build a record from column/value pairs
pub fn record<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers print without a trailing ".0", the way a sheet shows them
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialization() {
        let record: Record = serde_json::from_str(
            r#"{"KPI": "Literacy Rate", "Target": 90, "Due Date": "2025-10-01"}"#,
        )
        .unwrap();

        assert_eq!(record["KPI"], Value::Text("Literacy Rate".to_string()));
        assert_eq!(record["Target"], Value::Number(90.0));
        assert_eq!(
            record["Due Date"],
            Value::Date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
        );
    }

    #[test]
    fn test_serialization_keeps_shape() {
        let record = record([
            ("Department", Value::from("Works")),
            ("Score", Value::from(72)),
            ("Due Date", Value::from(NaiveDate::from_ymd_opt(2025, 11, 30).unwrap())),
        ]);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Department"], "Works");
        assert_eq!(json["Score"], 72.0);
        assert_eq!(json["Due Date"], "2025-11-30");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(85.0).to_string(), "85");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::from("Amber").to_string(), "Amber");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(" 75 ").as_number(), Some(75.0));
        assert_eq!(Value::from("n/a").as_number(), None);
        assert_eq!(
            Value::from("2025-09-30").as_date(),
            NaiveDate::from_ymd_opt(2025, 9, 30)
        );
        assert_eq!(Value::Number(3.0).as_date(), None);
    }
}
