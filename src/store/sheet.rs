//! Spreadsheet-backed store reached over a values API.
//!
//! Each logical table is one sheet tab. Row 1 holds the column names and every
//! following row is a record. Reads fetch the whole tab; writes replace it with
//! a single PUT so the remote never holds a half-written table.
//!
//! A values PUT only overwrites the cells it covers, so each write is padded
//! with empty cells out to the extent of what the tab held before. Whether a
//! tab exists is taken from the spreadsheet metadata, never from a status code:
//! a missing tab is an empty table, a missing spreadsheet is an error.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Cell};

use crate::error::StoreError;
use crate::models::{schema, Record, Value};
use crate::store::BackingStore;

/// Body of a values read or write
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(
        rename = "majorDimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Cell>>,
}

/// Spreadsheet metadata, trimmed to tab titles
#[derive(Debug, Default, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Remote spreadsheet store
#[derive(Debug, Clone)]
pub struct SheetStore {
    client: Client,
    base_url: String,
    sheet_id: String,
    token: String,
}

impl SheetStore {
    /// Creates a store for one spreadsheet
    ///
    /// `timeout` bounds every request made by the store.
    pub fn new(
        base_url: &str,
        sheet_id: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id,
            token,
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/v4/spreadsheets/{}", self.base_url, self.sheet_id)
    }

    fn values_url(&self, table: &str) -> String {
        format!("{}/values/{table}", self.spreadsheet_url())
    }

    async fn error_from(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Remote { status, body }
    }

    /// Whether the spreadsheet has a tab named `table`
    async fn has_tab(&self, table: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let spreadsheet: Spreadsheet = response.json().await?;
        Ok(spreadsheet
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == table))
    }

    async fn add_tab(&self, table: &str) -> Result<(), StoreError> {
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": table } } }]
        });

        let response = self
            .client
            .post(format!("{}:batchUpdate", self.spreadsheet_url()))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        tracing::info!("Created sheet tab '{}'", table);
        Ok(())
    }

    /// Raw cells of an existing tab, blank rows included
    async fn fetch_values(&self, table: &str) -> Result<Vec<Vec<Cell>>, StoreError> {
        let response = self
            .client
            .get(self.values_url(table))
            .query(&[
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let range: ValueRange = response.json().await?;
        Ok(range.values)
    }
}

/// Convert one sheet cell into a record value
fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Text(String::new()),
        Cell::Bool(b) => Value::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => serde_json::from_value(other.clone())
            .unwrap_or_else(|_| Value::Text(other.to_string())),
    }
}

fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::String(n.to_string())),
        other => Cell::String(other.to_string()),
    }
}

/// Turn header + data rows into records, skipping blank rows
pub fn rows_to_records(values: &[Vec<Cell>]) -> Vec<Record> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let header: Vec<String> = header
        .iter()
        .map(|c| cell_to_value(c).to_string())
        .collect();

    rows.iter()
        .filter(|row| !row.iter().all(is_blank))
        .map(|row| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| {
                    let value = row
                        .get(i)
                        .map(cell_to_value)
                        .unwrap_or_else(|| Value::Text(String::new()));
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Header for a write: schema order when the table is known, else sorted union
fn header_for(table: &str, records: &[Record]) -> Vec<String> {
    match schema(table) {
        Ok(schema) => schema.column_names(),
        Err(_) => records
            .iter()
            .flat_map(|r| r.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

/// Turn records into header + data rows
pub fn records_to_rows(table: &str, records: &[Record]) -> Vec<Vec<Cell>> {
    let header = header_for(table, records);
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(header.iter().map(|h| Cell::String(h.clone())).collect());

    for record in records {
        rows.push(
            header
                .iter()
                .map(|h| {
                    record
                        .get(h)
                        .map(value_to_cell)
                        .unwrap_or_else(|| Cell::String(String::new()))
                })
                .collect(),
        );
    }
    rows
}

fn is_blank(cell: &Cell) -> bool {
    matches!(cell, Cell::Null) || cell.as_str() == Some("")
}

/// Pad `rows` with empty cells so the write covers every cell of `existing`
pub fn overwrite_rows(mut rows: Vec<Vec<Cell>>, existing: &[Vec<Cell>]) -> Vec<Vec<Cell>> {
    let height = rows.len().max(existing.len());
    let width = rows
        .iter()
        .chain(existing)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    rows.resize_with(height, Vec::new);
    for row in &mut rows {
        row.resize_with(width, || Cell::String(String::new()));
    }
    rows
}

#[async_trait]
impl BackingStore for SheetStore {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn read_table(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        if !self.has_tab(table).await? {
            tracing::debug!("Sheet tab '{}' does not exist yet, treating as empty", table);
            return Ok(Vec::new());
        }

        let records = rows_to_records(&self.fetch_values(table).await?);
        tracing::debug!("Read {} rows from sheet tab '{}'", records.len(), table);
        Ok(records)
    }

    async fn write_table(&self, table: &str, records: &[Record]) -> Result<(), StoreError> {
        let existing = if self.has_tab(table).await? {
            self.fetch_values(table).await?
        } else {
            self.add_tab(table).await?;
            Vec::new()
        };

        let body = ValueRange {
            range: Some(table.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: overwrite_rows(records_to_rows(table, records), &existing),
        };

        let response = self
            .client
            .put(self.values_url(table))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        tracing::debug!("Wrote {} rows to sheet tab '{}'", records.len(), table);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "spreadsheetId")])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}
