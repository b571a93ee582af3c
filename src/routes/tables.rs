use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::constants::ERR_EMPTY_RECORD;
use crate::error::{AppError, Result};
use crate::models::{Record, RecordTable, TableSchema};
use crate::security::{Access, Credentials};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRecordRequest {
    pub record: Record,
    /// Overrides the table's declared key columns; `[]` forces an append
    #[serde(rename = "keyColumns", default)]
    pub key_columns: Option<Vec<String>>,
}

fn authorize(state: &AppState, headers: &HeaderMap, access: Access) -> Result<()> {
    let credentials = Credentials::from_headers(headers, &state.config.trusted_user_header);
    state.access.authorize(&credentials, access)
}

/// List every table with its columns and key columns
pub async fn list_tables(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<&'static [TableSchema]>> {
    authorize(&state, &headers, Access::Read)?;
    Ok(Json(state.store.tables()))
}

/// Load the full current table
pub async fn get_table(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RecordTable>> {
    authorize(&state, &headers, Access::Read)?;
    let table = state.store.load(&name).await?;
    Ok(Json(table))
}

/// Submit a form record
///
/// Updates the row whose key columns match, or appends a new row, and
/// returns the resulting table.
pub async fn submit_record(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SubmitRecordRequest>,
) -> Result<Json<RecordTable>> {
    authorize(&state, &headers, Access::Write)?;

    if payload.record.is_empty() {
        return Err(AppError::InvalidInput(ERR_EMPTY_RECORD.to_string()));
    }

    let table = match payload.key_columns {
        Some(keys) => {
            state
                .store
                .upsert_or_append(&name, &keys, &payload.record)
                .await?
        }
        None => state.store.submit(&name, &payload.record).await?,
    };

    Ok(Json(table))
}
