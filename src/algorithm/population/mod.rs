//! Population denominators and spatial aggregation
//!
//! This module turns case counts into per-capita rates, aggregates regions
//! into exposure zones and filters excluded regions.

pub mod filters;
pub mod rates;

// Re-export commonly used items
pub use filters::{FilterCriteria, RegionFilter};
pub use rates::{
    aggregate_by_group, label_by_name, outcome_series, pair_with_exposure, per_thousand,
    region_rates, series_rates,
};
