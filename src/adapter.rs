//! Record reconciliation over a pluggable backing store.
//!
//! A submission either updates the row whose key columns match it or is
//! appended as a new row; the whole table is then written back. The same steps
//! run against every [`BackingStore`].

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{AppError, Result, StoreError};
use crate::models::seed::demo_tables;
use crate::models::{schema, Record, RecordTable, TableSchema, CATALOG};
use crate::store::SharedStore;

/// What `merge_record` did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Row at this position was updated in place
    Updated(usize),
    Appended,
}

/// Merge a conformed candidate into `rows`
///
/// With key columns, the first row whose key tuple equals the candidate's has
/// its non-key columns overwritten and keeps its position. Without a match, or
/// without key columns, the candidate is appended.
pub fn merge_record(rows: &mut Vec<Record>, key_columns: &[String], candidate: Record) -> Merge {
    if !key_columns.is_empty() {
        let found = {
            let key = RecordTable::key_tuple(&candidate, key_columns);
            rows.iter()
                .position(|row| RecordTable::key_tuple(row, key_columns) == key)
        };

        if let Some(index) = found {
            let existing = &mut rows[index];
            for (column, value) in candidate {
                if !key_columns.contains(&column) {
                    existing.insert(column, value);
                }
            }
            return Merge::Updated(index);
        }
    }

    rows.push(candidate);
    Merge::Appended
}

/// Upsert-or-append adapter over one backing store
///
/// Writes through the same `RecordStore` are serialized. Separate processes
/// sharing one remote sheet are not coordinated: the last write wins.
pub struct RecordStore {
    backend: SharedStore,
    timeout: Duration,
    write_gate: Mutex<()>,
}

impl RecordStore {
    /// `timeout` bounds each individual backing store call
    ///
    /// Writes hand the budget to the store, which only reports a timeout when
    /// the write did not and will not land.
    pub fn new(backend: SharedStore, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            write_gate: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn tables(&self) -> &'static [TableSchema] {
        CATALOG
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    pub async fn ping(&self) -> std::result::Result<(), StoreError> {
        self.bounded(self.backend.ping()).await
    }

    /// Read the full current table
    ///
    /// A table the store has never seen loads as an empty snapshot.
    pub async fn load(&self, table: &str) -> Result<RecordTable> {
        let schema = schema(table)?;
        let rows = self
            .bounded(self.backend.read_table(table))
            .await
            .map_err(|e| {
                tracing::error!("Failed to read table '{}': {}", table, e);
                e
            })?;

        let records = rows
            .into_iter()
            .map(|row| schema.conform_stored(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} rows from '{}'", records.len(), table);
        Ok(RecordTable::with_records(schema, records))
    }

    /// Update the row matching `candidate` on `key_columns`, or append it
    ///
    /// An empty `key_columns` always appends. The candidate is validated
    /// before any store call, so a `SchemaMismatch` never touches the store.
    /// A failed write leaves the stored table as it was.
    pub async fn upsert_or_append(
        &self,
        table: &str,
        key_columns: &[String],
        candidate: &Record,
    ) -> Result<RecordTable> {
        let schema = schema(table)?;
        schema.check_key_columns(key_columns)?;
        let candidate = schema.conform_candidate(candidate).map_err(|e| {
            tracing::warn!("Rejected submission for '{}': {}", table, e);
            e
        })?;

        let _gate = self.write_gate.lock().await;

        let mut snapshot = self.load(table).await?;
        let merge = merge_record(&mut snapshot.records, key_columns, candidate);

        self.backend
            .write_table_within(table, &snapshot.records, self.timeout)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write table '{}': {}", table, e);
                AppError::BackingStoreUnavailable(e)
            })?;

        match merge {
            Merge::Updated(index) => {
                tracing::info!("Updated row {} of '{}'", index, table)
            }
            Merge::Appended => tracing::info!(
                "Appended row to '{}' ({} rows)",
                table,
                snapshot.len()
            ),
        }

        Ok(snapshot)
    }

    /// Upsert-or-append using the table's declared key columns
    pub async fn submit(&self, table: &str, candidate: &Record) -> Result<RecordTable> {
        let keys = schema(table)?.declared_keys();
        self.upsert_or_append(table, &keys, candidate).await
    }

    /// Write `rows` only if the store holds nothing for `table`
    pub async fn seed_if_empty(&self, table: &str, rows: &[Record]) -> Result<bool> {
        let schema = schema(table)?;
        let rows = rows
            .iter()
            .map(|row| schema.conform_candidate(row))
            .collect::<Result<Vec<_>>>()?;

        let _gate = self.write_gate.lock().await;

        if !self.bounded(self.backend.read_table(table)).await?.is_empty() {
            return Ok(false);
        }
        self.backend
            .write_table_within(table, &rows, self.timeout)
            .await?;

        tracing::info!("Seeded '{}' with {} demo rows", table, rows.len());
        Ok(true)
    }

    /// Seed every demo table that is still empty, returning how many were written
    pub async fn seed_demo_data(&self) -> Result<usize> {
        let mut seeded = 0;
        for (table, rows) in demo_tables() {
            if self.seed_if_empty(table, &rows).await? {
                seeded += 1;
            }
        }
        Ok(seeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{record, Value};

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn risk(issue: &str) -> Record {
        record([("Department", Value::from("Works")), ("Issue", Value::from(issue))])
    }

    fn kpi(name: &str, current: i32) -> Record {
        record([
            ("Department", Value::from("Health")),
            ("KPI", Value::from(name)),
            ("Current", Value::from(current)),
        ])
    }

    #[test]
    fn test_merge_appends_without_keys() {
        let mut rows = vec![risk("Flooding")];
        assert_eq!(merge_record(&mut rows, &[], risk("Flooding")), Merge::Appended);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_merge_updates_in_place() {
        let mut rows = vec![kpi("A", 1), kpi("B", 2), kpi("C", 3)];

        let merge = merge_record(&mut rows, &keys(&["Department", "KPI"]), kpi("B", 20));

        assert_eq!(merge, Merge::Updated(1));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["Current"], Value::from(20));
        assert_eq!(rows[0]["KPI"], Value::from("A"));
        assert_eq!(rows[2]["KPI"], Value::from("C"));
    }

    #[test]
    fn test_merge_appends_on_new_key() {
        let mut rows = vec![kpi("A", 1)];
        let merge = merge_record(&mut rows, &keys(&["Department", "KPI"]), kpi("B", 2));
        assert_eq!(merge, Merge::Appended);
        assert_eq!(rows[1]["KPI"], Value::from("B"));
    }

    #[test]
    fn test_merge_updates_first_of_duplicates() {
        let mut rows = vec![kpi("A", 1), kpi("A", 2)];

        let merge = merge_record(&mut rows, &keys(&["KPI"]), kpi("A", 9));

        assert_eq!(merge, Merge::Updated(0));
        assert_eq!(rows[0]["Current"], Value::from(9));
        assert_eq!(rows[1]["Current"], Value::from(2));
    }

    #[test]
    fn test_merge_key_values_must_all_match() {
        let mut rows = vec![kpi("A", 1)];
        let mut other_department = kpi("A", 5);
        other_department.insert("Department".to_string(), Value::from("Works"));

        let merge = merge_record(&mut rows, &keys(&["Department", "KPI"]), other_department);

        assert_eq!(merge, Merge::Appended);
        assert_eq!(rows.len(), 2);
    }
}
