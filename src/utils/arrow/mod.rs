//! Arrow data handling utilities
//!
//! Helpers for looking up, casting and extracting columns of record
//! batches read from input tables.

pub mod array_utils;
pub mod extractors;

// Re-export commonly used functions for convenience
pub use array_utils::{downcast_array, get_column, require_column};
pub use extractors::{extract_float64, extract_int64, extract_string, other_columns};
