use serde::Serialize;

use crate::models::schema::TableSchema;
use crate::models::value::{Record, Value};

/// Full snapshot of one logical table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTable {
    pub name: String,
    /// Column order as declared by the schema
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordTable {
    pub fn empty(schema: &TableSchema) -> Self {
        Self::with_records(schema, Vec::new())
    }

    pub fn with_records(schema: &TableSchema, records: Vec<Record>) -> Self {
        Self {
            name: schema.name.to_string(),
            columns: schema.column_names(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of `record` at `keys`, in key order
    pub fn key_tuple<'a>(record: &'a Record, keys: &[String]) -> Vec<Option<&'a Value>> {
        keys.iter().map(|k| record.get(k)).collect()
    }
}
