//! IO utilities for Parquet tables
//!
//! Low-level batch reading and record writing in [`parquet`](self::parquet), and the
//! readers for the analysis input tables in [`tables`].

pub mod parquet;
pub mod tables;

// Re-export commonly used functions for convenience
pub use self::parquet::{find_parquet_files, read_parquet, records_to_batch, write_batch, write_records};
pub use tables::{
    extract_region_codes, read_exposure, read_incidence, read_names, read_paired, read_population,
};
