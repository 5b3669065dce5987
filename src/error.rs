//! Error types shared by the simulation core and its I/O collaborators.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// `simulate` was handed zero load records.
    #[error("load sequence is empty: nothing to simulate")]
    EmptyInput,

    #[error("invalid time \"{value}\": expected HH:MM:SS")]
    InvalidTime { value: String },

    #[error("row {row}: cannot read a wall-clock time from \"{value}\"")]
    InvalidRecordTime { row: usize, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
