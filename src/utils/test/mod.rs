//! Test utilities
//!
//! Fixture builders shared by the unit tests and the integration tests
//! under `tests/`.


// Re-export commonly used functions for convenience
pub use fixtures::{
    full_year, lagged_paired_rows, lagged_series, partial_year, region, rows_for, scratch_dir,
};
