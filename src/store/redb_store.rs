use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::Record;
use crate::store::BackingStore;

/// Record tables: table name -> JSON-encoded rows
pub const RECORD_TABLES: TableDefinition<&str, &[u8]> = TableDefinition::new("record_tables");

/// Durable store backed by a local redb file
///
/// Every blocking task holds `busy` until it returns, so a write whose caller
/// went away still finishes before the next read starts.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    busy: Arc<Mutex<()>>,
}

impl RedbStore {
    /// Open or create the redb database at the given path
    ///
    /// Creates the record table on first run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        tracing::info!("Opening database at: {:?}", path.as_ref());

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    tracing::error!("Failed to create database directory: {}", e);
                    StoreError::Database(redb::Error::Io(e))
                })?;
            }
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORD_TABLES)?;
        }
        write_txn.commit()?;

        tracing::info!("Database initialized successfully");

        Ok(Self {
            db: Arc::new(db),
            busy: Arc::new(Mutex::new(())),
        })
    }

    /// Replace `table` in one write transaction
    ///
    /// With a budget, a transaction that is not ready to commit in time is
    /// aborted instead.
    async fn commit_rows(
        &self,
        table: &str,
        records: &[Record],
        budget: Option<Duration>,
    ) -> Result<(), StoreError> {
        let deadline = budget.map(|budget| (Instant::now() + budget, budget));
        let db = self.db.clone();
        let table = table.to_string();
        let bytes = serde_json::to_vec(records)?;

        let busy = match deadline {
            Some((at, budget)) => tokio::time::timeout_at(
                tokio::time::Instant::from_std(at),
                self.busy.clone().lock_owned(),
            )
            .await
            .map_err(|_| StoreError::Timeout(budget))?,
            None => self.busy.clone().lock_owned().await,
        };

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let _busy = busy;
            let write_txn = db.begin_write()?;
            {
                let mut tables = write_txn.open_table(RECORD_TABLES)?;
                tables.insert(table.as_str(), bytes.as_slice())?;
            }

            if let Some((at, budget)) = deadline {
                if Instant::now() >= at {
                    write_txn.abort()?;
                    tracing::warn!("Aborted write to '{}' past its deadline", table);
                    return Err(StoreError::Timeout(budget));
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?
    }
}

#[async_trait]
impl BackingStore for RedbStore {
    fn name(&self) -> &'static str {
        "redb"
    }

    async fn read_table(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let db = self.db.clone();
        let table = table.to_string();
        let busy = self.busy.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || -> Result<Vec<Record>, StoreError> {
            let _busy = busy;
            let read_txn = db.begin_read()?;
            let tables = read_txn.open_table(RECORD_TABLES)?;

            let rows = match tables.get(table.as_str())? {
                Some(bytes) => serde_json::from_slice(bytes.value())?,
                None => Vec::new(),
            };
            Ok(rows)
        })
        .await?
    }

    async fn write_table(&self, table: &str, records: &[Record]) -> Result<(), StoreError> {
        self.commit_rows(table, records, None).await
    }

    /// The blocking task is always awaited, so a timeout here means the
    /// transaction was aborted
    async fn write_table_within(
        &self,
        table: &str,
        records: &[Record],
        budget: Duration,
    ) -> Result<(), StoreError> {
        self.commit_rows(table, records, Some(budget)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let _read_txn = db.begin_read()?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{record, Value};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("hub.redb");
        let rows = vec![record([
            ("Department", Value::from("Health")),
            ("Score", Value::from(76)),
        ])];

        {
            let store = RedbStore::open(&path).unwrap();
            assert!(store.read_table("scores").await.unwrap().is_empty());
            store.write_table("scores", &rows).await.unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.read_table("scores").await.unwrap(), rows);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_write_past_budget_is_aborted() {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbStore::open(temp_dir.path().join("hub.redb")).unwrap();
        let old = vec![record([("Department", Value::from("Works"))])];
        let new = vec![record([("Department", Value::from("Health"))])];
        store.write_table("scores", &old).await.unwrap();

        let err = store
            .write_table_within("scores", &new, Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Timeout(_)));
        assert_eq!(store.read_table("scores").await.unwrap(), old);
    }

    #[tokio::test]
    async fn test_write_within_budget_commits() {
        let temp_dir = TempDir::new().unwrap();
        let store = RedbStore::open(temp_dir.path().join("hub.redb")).unwrap();
        let rows = vec![record([("Department", Value::from("Health"))])];

        store
            .write_table_within("scores", &rows, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(store.read_table("scores").await.unwrap(), rows);
    }
}
