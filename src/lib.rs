//! Strategy Hub record store
//!
//! Reconciles dashboard form submissions into record tables held by a
//! volatile, local or remote spreadsheet backing store.

pub mod adapter;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod session;
pub mod store;

pub use adapter::RecordStore;
pub use config::Config;
pub use error::{AppError, Result, StoreError};
pub use session::Session;
pub use store::{open_store, BackingStore, SharedStore};

use std::sync::Arc;

use security::SharedPolicy;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub access: SharedPolicy,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState from its parts
    pub fn new(store: Arc<RecordStore>, access: SharedPolicy, config: Config) -> Self {
        Self {
            store,
            access,
            config,
        }
    }
}
