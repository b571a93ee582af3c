use serde::Serialize;

use crate::constants::{
    BUDGETS, DOCUMENTS, ERR_DUPLICATE_KEY_COLUMN, KPIS, POLICY_ACTIONS, PROJECTS, RISKS, SCORES,
    WEEKLY_EVAL,
};
use crate::error::{AppError, Result, StoreError};
use crate::models::value::{Record, Value};

/// Type a column's values are coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    /// Text restricted to a fixed option list
    Choice(&'static [&'static str]),
}

impl ColumnKind {
    /// Coerce a value to this kind, `None` if it cannot be represented
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ColumnKind::Text => Some(Value::Text(value.to_string())),
            ColumnKind::Number => value
                .as_number()
                .filter(|n| n.is_finite())
                .map(Value::Number),
            ColumnKind::Date => value.as_date().map(Value::Date),
            ColumnKind::Choice(options) => match value {
                Value::Text(s) if options.contains(&s.as_str()) => Some(value.clone()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn number(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Number,
    }
}

const fn date(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Date,
    }
}

const fn choice(name: &'static str, options: &'static [&'static str]) -> Column {
    Column {
        name,
        kind: ColumnKind::Choice(options),
    }
}

pub const KPI_STATUSES: &[&str] = &["Green", "Amber", "Red"];
pub const POLICY_PROGRESS: &[&str] = &["Ongoing", "Planned", "Delayed", "Completed"];
pub const URGENCY_LEVELS: &[&str] = &["Low", "Medium", "High", "Critical"];

/// Declared shape of one logical table
///
/// An empty `key_columns` makes the table an append-only log.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    #[serde(rename = "keyColumns")]
    pub key_columns: &'static [&'static str],
}

/// Every table the hub knows about
pub static CATALOG: &[TableSchema] = &[
    TableSchema {
        name: KPIS,
        columns: &[
            text("Department"),
            text("KPI"),
            number("Target"),
            number("Current"),
            choice("Status", KPI_STATUSES),
        ],
        key_columns: &["Department", "KPI"],
    },
    TableSchema {
        name: POLICY_ACTIONS,
        columns: &[
            text("Policy Action"),
            text("Responsible"),
            date("Due Date"),
            choice("Progress", POLICY_PROGRESS),
        ],
        key_columns: &["Policy Action"],
    },
    TableSchema {
        name: SCORES,
        columns: &[text("Department"), number("Score")],
        key_columns: &["Department"],
    },
    TableSchema {
        name: PROJECTS,
        columns: &[
            text("Project"),
            text("Department"),
            number("Latitude"),
            number("Longitude"),
            text("Status"),
        ],
        key_columns: &["Project"],
    },
    TableSchema {
        name: BUDGETS,
        columns: &[
            text("Department"),
            text("Fiscal Year"),
            number("Allocated"),
            number("Spent"),
        ],
        key_columns: &["Department", "Fiscal Year"],
    },
    TableSchema {
        name: RISKS,
        columns: &[
            text("Department"),
            text("Issue"),
            choice("Urgency", URGENCY_LEVELS),
            date("Reported On"),
        ],
        key_columns: &[],
    },
    TableSchema {
        name: WEEKLY_EVAL,
        columns: &[text("Department"), date("Week Ending"), text("Summary")],
        key_columns: &[],
    },
    TableSchema {
        name: DOCUMENTS,
        columns: &[
            text("File Name"),
            text("Category"),
            text("Uploaded By"),
            date("Uploaded On"),
        ],
        key_columns: &[],
    },
];

/// Look up a table schema by name
pub fn schema(name: &str) -> Result<&'static TableSchema> {
    CATALOG
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| AppError::UnknownTable(name.to_string()))
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.to_string()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn declared_keys(&self) -> Vec<String> {
        self.key_columns.iter().map(|k| k.to_string()).collect()
    }

    /// Key columns must name schema columns, each at most once
    pub fn check_key_columns(&self, keys: &[String]) -> Result<()> {
        for (i, key) in keys.iter().enumerate() {
            if !self.has_column(key) {
                tracing::warn!("Key column '{}' is not part of table '{}'", key, self.name);
                return Err(AppError::schema_mismatch(self.name, key));
            }
            if keys[..i].contains(key) {
                return Err(AppError::InvalidInput(ERR_DUPLICATE_KEY_COLUMN.to_string()));
            }
        }
        Ok(())
    }

    /// Project a submitted record onto this schema
    ///
    /// Extra columns are dropped. A missing column or a value that cannot be
    /// coerced to its column kind is a `SchemaMismatch`.
    pub fn conform_candidate(&self, candidate: &Record) -> Result<Record> {
        let mut conformed = Record::new();
        for column in self.columns {
            let value = candidate
                .get(column.name)
                .ok_or_else(|| AppError::schema_mismatch(self.name, column.name))?;
            let value = column
                .kind
                .coerce(value)
                .ok_or_else(|| AppError::schema_mismatch(self.name, column.name))?;
            conformed.insert(column.name.to_string(), value);
        }
        Ok(conformed)
    }

    /// Project a stored row onto this schema
    ///
    /// Values that do not coerce are kept as stored; a missing column means the
    /// backing store has drifted from the schema.
    pub fn conform_stored(&self, row: Record) -> std::result::Result<Record, StoreError> {
        let mut row = row;
        let mut conformed = Record::new();
        for column in self.columns {
            let value = row.remove(column.name).ok_or_else(|| StoreError::SchemaDrift {
                table: self.name.to_string(),
                column: column.name.to_string(),
            })?;
            let value = column.kind.coerce(&value).unwrap_or(value);
            conformed.insert(column.name.to_string(), value);
        }
        Ok(conformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::value::record;

    fn kpi_candidate() -> Record {
        record([
            ("Department", Value::from("Health")),
            ("KPI", Value::from("Maternal Health Index")),
            ("Target", Value::from(85)),
            ("Current", Value::from("75")),
            ("Status", Value::from("Amber")),
        ])
    }

    #[test]
    fn test_catalog_keys_are_columns() {
        for schema in CATALOG {
            let keys = schema.declared_keys();
            assert!(schema.check_key_columns(&keys).is_ok(), "{}", schema.name);
        }
    }

    #[test]
    fn test_unknown_table() {
        assert!(matches!(schema("minutes"), Err(AppError::UnknownTable(_))));
        assert_eq!(schema(KPIS).unwrap().key_columns, &["Department", "KPI"]);
    }

    #[test]
    fn test_conform_candidate_coerces_and_drops_extras() {
        let mut candidate = kpi_candidate();
        candidate.insert("Comment".to_string(), Value::from("ignored"));

        let conformed = schema(KPIS).unwrap().conform_candidate(&candidate).unwrap();

        assert_eq!(conformed.len(), 5);
        assert_eq!(conformed["Current"], Value::Number(75.0));
        assert!(!conformed.contains_key("Comment"));
    }

    #[test]
    fn test_conform_candidate_missing_column() {
        let mut candidate = kpi_candidate();
        candidate.remove("Target");

        let err = schema(KPIS).unwrap().conform_candidate(&candidate).unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch { ref column, .. } if column == "Target"));
    }

    #[test]
    fn test_conform_candidate_rejects_bad_values() {
        let mut candidate = kpi_candidate();
        candidate.insert("Status".to_string(), Value::from("Purple"));
        let err = schema(KPIS).unwrap().conform_candidate(&candidate).unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch { ref column, .. } if column == "Status"));

        let mut candidate = kpi_candidate();
        candidate.insert("Target".to_string(), Value::from("high"));
        let err = schema(KPIS).unwrap().conform_candidate(&candidate).unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch { ref column, .. } if column == "Target"));
    }

    #[test]
    fn test_text_column_keeps_date_like_strings_as_text() {
        let candidate = record([
            ("Department", Value::from("Works")),
            ("Fiscal Year", Value::from("2025-07-01")),
            ("Allocated", Value::from(1000)),
            ("Spent", Value::from(250)),
        ]);

        let conformed = schema(BUDGETS).unwrap().conform_candidate(&candidate).unwrap();
        assert_eq!(conformed["Fiscal Year"], Value::Text("2025-07-01".to_string()));
    }

    #[test]
    fn test_check_key_columns() {
        let kpis = schema(KPIS).unwrap();
        assert!(kpis.check_key_columns(&["KPI".to_string()]).is_ok());
        assert!(matches!(
            kpis.check_key_columns(&["Owner".to_string()]),
            Err(AppError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            kpis.check_key_columns(&["KPI".to_string(), "KPI".to_string()]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_conform_stored_reports_drift() {
        let mut row = kpi_candidate();
        row.remove("Status");

        let err = schema(KPIS).unwrap().conform_stored(row).unwrap_err();
        assert!(matches!(err, StoreError::SchemaDrift { ref column, .. } if column == "Status"));
    }

    #[test]
    fn test_conform_stored_keeps_uncoercible_values() {
        let mut row = kpi_candidate();
        row.insert("Target".to_string(), Value::from(""));

        let conformed = schema(KPIS).unwrap().conform_stored(row).unwrap();
        assert_eq!(conformed["Target"], Value::from(""));
        assert_eq!(conformed["Current"], Value::Number(75.0));
    }
}
