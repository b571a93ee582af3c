use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::RecordStore;
use crate::error::Result;
use crate::models::{Record, RecordTable};

/// One user's view of the hub
///
/// Holds the last snapshot of each table that was loaded or written
/// successfully. A failed store call leaves that snapshot untouched. Created
/// when a user session starts; dropping it discards the snapshots.
///
/// This is library API for front ends that keep per-user state, such as an
/// embedded dashboard. The HTTP routes are stateless and call [`RecordStore`]
/// directly, returning a fresh snapshot with every response.
pub struct Session {
    store: Arc<RecordStore>,
    snapshots: HashMap<String, RecordTable>,
}

impl Session {
    pub fn new(store: Arc<RecordStore>) -> Self {
        tracing::debug!("Session opened on {} store", store.backend_name());
        Self {
            store,
            snapshots: HashMap::new(),
        }
    }

    /// Last good snapshot of `table`, if one was ever taken
    pub fn view(&self, table: &str) -> Option<&RecordTable> {
        self.snapshots.get(table)
    }

    /// Reload `table` from the store
    pub async fn refresh(&mut self, table: &str) -> Result<&RecordTable> {
        let snapshot = self.store.load(table).await?;
        Ok(self.remember(snapshot))
    }

    /// Submit a form record using the table's declared key columns
    pub async fn submit(&mut self, table: &str, candidate: &Record) -> Result<&RecordTable> {
        let snapshot = self.store.submit(table, candidate).await?;
        Ok(self.remember(snapshot))
    }

    pub async fn upsert_or_append(
        &mut self,
        table: &str,
        key_columns: &[String],
        candidate: &Record,
    ) -> Result<&RecordTable> {
        let snapshot = self
            .store
            .upsert_or_append(table, key_columns, candidate)
            .await?;
        Ok(self.remember(snapshot))
    }

    fn remember(&mut self, snapshot: RecordTable) -> &RecordTable {
        match self.snapshots.entry(snapshot.name.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(snapshot);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(snapshot),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!("Session closed, discarding {} snapshots", self.snapshots.len());
    }
}
