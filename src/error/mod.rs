//! Error handling for incidence analysis.

pub mod util;

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for incidence analysis
#[derive(Debug, thiserror::Error)]
pub enum IncidenceError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error with an annotated path
    #[error("IO error at {path}: {message}")]
    PathIo {
        /// Path involved in the failed operation
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting records to or from Arrow
    #[error("Record conversion error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),

    /// Error parsing a JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from an input table
    #[error("Column not found: {column}")]
    ColumnNotFound {
        /// Name of the missing column
        column: String,
    },

    /// A region code could not be normalized to four digits
    #[error("Invalid region code: '{0}'")]
    InvalidRegionCode(String),

    /// A period index outside `1..=P`
    #[error("Invalid period {period} (expected 1..={max})")]
    InvalidPeriod {
        /// The offending period index
        period: u32,
        /// Number of periods in the calendar
        max: u32,
    },

    /// Duplicate (region, year, period) rows under the reject policy
    #[error("{count} duplicate rows for region {region}, year {year}")]
    DuplicateRows {
        /// Region code
        region: String,
        /// Year of the duplicated rows
        year: i32,
        /// Number of duplicated periods
        count: usize,
    },

    /// A required input table is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IncidenceError {
    /// Create an IO error annotated with a path
    pub fn path_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PathIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing-column error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

/// Result type for incidence analysis operations
pub type Result<T> = std::result::Result<T, IncidenceError>;
