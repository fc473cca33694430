use std::path::PathBuf;
use thiserror::Error;

/// Problems with the shape or content of an incoming table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed value {value:?} in column {field} (row {row}): {reason}")]
    MalformedField {
        field: String,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("column {field} has no values to rank")]
    NoValues { field: String },
}

impl SchemaError {
    /// Column names the caller should surface to the user.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            SchemaError::MissingColumns(cols) => cols.iter().map(String::as_str).collect(),
            SchemaError::MalformedField { field, .. } | SchemaError::NoValues { field } => {
                vec![field.as_str()]
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("table has no rows to aggregate")]
    EmptyTable,

    #[error("projection horizon must be positive, got {horizon}")]
    InvalidHorizon { horizon: i32 },

    #[error("cannot build report, missing columns: {}", .missing.join(", "))]
    ReportData { missing: Vec<String> },

    #[error("model artifact unavailable at {}: {reason}", .path.display())]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("no campaigns found for client {0:?}")]
    UnknownClient(String),

    #[error("unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, CampaignError>;
