//! Utility functions for table I/O, logging and tests
//!
//! This module contains various utilities organized into submodules:
//! - `arrow`: Arrow column lookup, casting and extraction
//! - `io`: Parquet reading and writing, input table readers
//! - `logging`: Operation logs and progress bars
//! - `test`: Fixture builders

pub mod arrow;
pub mod io;
pub mod logging;
pub mod test;

// Re-export commonly used functions for convenience
pub use io::{read_parquet, write_records};
pub use logging::{log_operation_complete, log_operation_start, log_warning};
