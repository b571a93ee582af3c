//! Backing stores holding the durable copy of each record table.

pub mod memory;
pub mod redb_store;
pub mod sheet;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::models::Record;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use sheet::SheetStore;

/// Persistence contract every backing store fulfils
///
/// `read_table` on a table that was never written returns an empty vector.
/// `write_table` replaces the whole table and must be atomic: later reads see
/// either the old rows or the new rows, never a mix.
///
/// The adapter writes through `write_table_within`. When it returns an error
/// the table must hold the old rows, now and later.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Short label used in logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn read_table(&self, table: &str) -> Result<Vec<Record>, StoreError>;

    async fn write_table(&self, table: &str, records: &[Record]) -> Result<(), StoreError>;

    /// `write_table` bounded by `budget`
    ///
    /// The default drops the write future once the budget runs out, which is
    /// only sound when dropping it abandons the write. Stores that hand the
    /// write to another thread override this and decide at their commit point.
    async fn write_table_within(
        &self,
        table: &str,
        records: &[Record],
        budget: Duration,
    ) -> Result<(), StoreError> {
        match tokio::time::timeout(budget, self.write_table(table, records)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(budget)),
        }
    }

    /// Cheap reachability check
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store handle shared by the adapter and the health check
pub type SharedStore = Arc<dyn BackingStore>;

/// Build the backing store selected by configuration
pub fn open_store(config: &Config) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Redb => Arc::new(RedbStore::open(&config.database_path)?),
        StoreBackend::Sheet => {
            let sheet_id = config.sheet_id.clone().ok_or_else(|| {
                StoreError::Unavailable("SHEET_ID must be set for the sheet backend".to_string())
            })?;
            let token = config.sheet_api_token.clone().ok_or_else(|| {
                StoreError::Unavailable(
                    "SHEET_API_TOKEN must be set for the sheet backend".to_string(),
                )
            })?;
            Arc::new(SheetStore::new(
                &config.sheet_api_url,
                sheet_id,
                token,
                Duration::from_secs(config.store_timeout_secs),
            )?)
        }
    };

    tracing::info!("Using {} backing store", store.name());
    Ok(store)
}
