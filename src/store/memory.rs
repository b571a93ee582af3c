use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::Record;
use crate::store::BackingStore;

/// Volatile store living as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_table(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    async fn write_table(&self, table: &str, records: &[Record]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.insert(table.to_string(), records.to_vec());
        Ok(())
    }
}
