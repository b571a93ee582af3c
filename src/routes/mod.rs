pub mod health;
pub mod tables;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_check;
pub use tables::{get_table, list_tables, submit_record};

/// Routes without the CORS and tracing layers added by the binary
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tables", get(list_tables))
        .route("/api/tables/:name", get(get_table))
        .route("/api/tables/:name/records", post(submit_record))
        .with_state(state)
}
