//! Queries, their lifecycle states, and precision-safe result sets.

use crate::error::{Result, SqldeckError};
use crate::ids::{EditorId, QueryId};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle state of a submitted query.
///
/// `Pending` is the initial state; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Success,
    Failed,
    Stopped,
}

impl QueryStatus {
    /// Returns true for the three terminal outcomes.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A single query submission tracked by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub query_editor_id: EditorId,
    pub sql: String,
    pub status: QueryStatus,
    /// Submission time, epoch milliseconds.
    pub started_at: u64,
    pub results: Option<ResultSet>,
    /// Coarse progress indicator, 0..=100.
    pub progress: u8,
    pub error_message: Option<String>,
    pub is_data_preview: bool,
}

impl Query {
    /// Creates a new pending query with a fresh client id.
    pub fn new(query_editor_id: EditorId, sql: impl Into<String>, is_data_preview: bool) -> Self {
        Self {
            id: QueryId::generate(),
            query_editor_id,
            sql: sql.into(),
            status: QueryStatus::Pending,
            started_at: epoch_millis(),
            results: None,
            progress: 0,
            error_message: None,
            is_data_preview,
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
}

/// A single cell value from a result set.
///
/// Numbers are carried as their original source text so 64-bit integers
/// never round-trip through `f64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(String),
    Text(String),
}

impl CellValue {
    /// Returns the cell rendered as display text.
    pub fn as_display(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.clone(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// A decoded result set for one query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<CellValue>>,
    /// Backend-assigned key used to re-fetch result pages.
    pub result_key: Option<String>,
    pub row_count: usize,
}

impl ResultSet {
    /// Creates a result set from columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            result_key: None,
            row_count,
        }
    }
}

/// Decodes an execution-endpoint response body into a [`ResultSet`].
///
/// The body is parsed with serde_json's arbitrary-precision numbers, so
/// numeric cells keep their exact source text. Rows may arrive either as
/// arrays aligned with `columns` or as objects keyed by column name.
pub fn decode_result_set(body: &str) -> Result<ResultSet> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SqldeckError::decode(format!("Invalid result body: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| SqldeckError::decode("Result body is not a JSON object"))?;

    let columns: Vec<ColumnInfo> = match obj.get("columns") {
        Some(cols) => serde_json::from_value(cols.clone())
            .map_err(|e| SqldeckError::decode(format!("Invalid columns: {e}")))?,
        None => Vec::new(),
    };

    let result_key = obj.get("query_id").map(|v| match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let raw_rows = match obj.get("data") {
        Some(serde_json::Value::Array(rows)) => rows.as_slice(),
        Some(_) => return Err(SqldeckError::decode("Result field `data` is not an array")),
        None => &[],
    };

    let mut rows = Vec::with_capacity(raw_rows.len());
    for raw in raw_rows {
        match raw {
            serde_json::Value::Array(cells) => {
                rows.push(cells.iter().map(decode_cell).collect());
            }
            serde_json::Value::Object(map) => {
                let row = columns
                    .iter()
                    .map(|col| map.get(&col.name).map(decode_cell).unwrap_or_default())
                    .collect();
                rows.push(row);
            }
            other => {
                return Err(SqldeckError::decode(format!(
                    "Result row is neither array nor object: {other}"
                )))
            }
        }
    }

    Ok(ResultSet {
        row_count: rows.len(),
        columns,
        rows,
        result_key,
    })
}

fn decode_cell(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Null,
        serde_json::Value::Bool(b) => CellValue::Bool(*b),
        // arbitrary_precision keeps the original token text
        serde_json::Value::Number(n) => CellValue::Number(n.to_string()),
        serde_json::Value::String(s) => CellValue::Text(s.clone()),
        nested => CellValue::Text(nested.to_string()),
    }
}
