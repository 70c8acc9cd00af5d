//! Calendar completion, shape clustering and exposure lag scanning for
//! regional disease-incidence series.
//!
//! Incidence tables are normalized to a fixed calendar, gaps are imputed,
//! and regions are clustered by the shape of their annual series. Paired
//! exposure/outcome tables are scanned for the temporal shift at which the
//! exposure best predicts incidence.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{
    AnalysisConfig, ClusteringConfig, DuplicatePolicy, ImputationConfig, RateInputs, ScanConfig,
    SpatialJoin,
};
pub use error::{IncidenceError, Result};
pub use models::{
    ClusterLabel, LagCandidate, Observation, PeriodKind, Provenance, RegionId, SeriesKey,
    SparseRow, SpatialUnit,
};

// Subsystems
pub use algorithm::calendar::normalize_all;
pub use algorithm::clustering::RegionClusterer;
pub use algorithm::imputation::{ImputationOutcome, Imputer, SeriesStore};
pub use algorithm::lag::{LagScanner, ScanInput, ScanReport};
pub use algorithm::population::RegionFilter;

// Batch driver
pub use pipeline::{
    IncidenceReport, LagReport, RateTables, process_batch, process_file, process_incidence,
    scan_input, scan_paired, scan_rows,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;
