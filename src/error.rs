use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure inside a backing store
///
/// Every variant reaches callers as [`AppError::BackingStoreUnavailable`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Database open error: {0}")]
    DatabaseOpen(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Remote table '{table}' is missing column '{column}'")]
    SchemaDrift { table: String, column: String },

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Record for table '{table}' does not fit column '{column}'")]
    SchemaMismatch { table: String, column: String },

    #[error("Backing store unavailable: {0}")]
    BackingStoreUnavailable(#[from] StoreError),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,
}

impl AppError {
    pub(crate) fn schema_mismatch(table: &str, column: &str) -> Self {
        AppError::SchemaMismatch {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::SchemaMismatch { ref table, ref column } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Record for '{table}' is missing or has an invalid '{column}'"),
            ),
            AppError::BackingStoreUnavailable(ref e) => {
                tracing::error!("Backing store error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Backing store unavailable, try again".to_string(),
                )
            }
            AppError::UnknownTable(ref name) => {
                (StatusCode::NOT_FOUND, format!("Unknown table: {name}"))
            }
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
