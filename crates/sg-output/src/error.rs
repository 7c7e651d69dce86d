//! Error types for sg-output.

use thiserror::Error;

/// Errors that can occur when writing measurements to a sink.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Transport failure or non-success status from the search service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The search service answered but rejected the request.
    #[error("search service error: {0}")]
    Search(String),

    /// A sink or buffer was constructed with unusable settings.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{sink} sink received a {got} measurement but writes {expected}")]
    WrongSensorType {
        sink:     &'static str,
        expected: sg_core::SensorType,
        got:      sg_core::SensorType,
    },
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
