// Error handling for the waveform browser analysis core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WfbError>;

#[derive(Error, Debug)]
pub enum WfbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid window [{start}, {end}]: {reason}")]
    InvalidWindow { start: f64, end: f64, reason: String },

    #[error("Inconsistent column length: column {column} has {got} samples, time axis has {expected}")]
    InconsistentColumnLength {
        column: usize,
        expected: usize,
        got: usize,
    },

    #[error("Time axis is not strictly increasing at row {index}")]
    UnorderedTimeAxis { index: usize },

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Invalid categorizer: {0}")]
    InvalidCategorizer(String),

    #[error("Fetch already in progress for event {pending}")]
    FetchInProgress { pending: u64 },
}

impl WfbError {
    pub(crate) fn window(start: f64, end: f64, reason: impl Into<String>) -> Self {
        WfbError::InvalidWindow {
            start,
            end,
            reason: reason.into(),
        }
    }
}
