//! Error types for the insight pipeline.

/// Top-level error enum shared by every module.
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("Database unavailable")]
    Unavailable,

    #[error("Invalid table identifier: {0}")]
    Identifier(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("GeoJSON error: {0}")]
    Geo(#[from] geojson::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type InsightResult<T> = Result<T, InsightError>;
