//! Region filtering criteria
//!
//! Outlying islands are excluded from every analysis in the reference
//! deployment: all codes under county prefix "44" plus two townships of
//! prefix "46".

use log::info;
use serde::{Deserialize, Serialize};

use crate::models::{AreaCounts, RegionId, SparseRow};

/// Defines a criterion for filtering rows
pub trait FilterCriteria<T> {
    /// Determine if an entity meets the filter criteria
    fn meets_criteria(&self, entity: &T) -> bool;
}

/// Excludes regions by county prefix or by exact code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionFilter {
    /// Code prefixes to exclude
    pub excluded_prefixes: Vec<String>,
    /// Exact codes to exclude
    pub excluded_codes: Vec<String>,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec!["44".to_string()],
            excluded_codes: vec!["4611".to_string(), "4616".to_string()],
        }
    }
}

impl RegionFilter {
    /// A filter that keeps every region
    #[must_use]
    pub fn none() -> Self {
        Self {
            excluded_prefixes: Vec::new(),
            excluded_codes: Vec::new(),
        }
    }

    /// Whether a region is excluded
    #[must_use]
    pub fn excludes(&self, region: &RegionId) -> bool {
        let code = region.as_str();
        self.excluded_prefixes.iter().any(|p| code.starts_with(p.as_str()))
            || self.excluded_codes.iter().any(|c| c == code)
    }

    /// Drop excluded rows in place; returns the number of dropped rows
    pub fn retain(&self, rows: &mut Vec<SparseRow>) -> usize {
        let before = rows.len();
        rows.retain(|row| self.meets_criteria(row));
        let dropped = before - rows.len();
        if dropped > 0 {
            info!("Excluded {dropped} rows of filtered regions");
        }
        dropped
    }
}

impl FilterCriteria<SparseRow> for RegionFilter {
    fn meets_criteria(&self, row: &SparseRow) -> bool {
        !self.excludes(&row.region)
    }
}

impl FilterCriteria<AreaCounts> for RegionFilter {
    fn meets_criteria(&self, counts: &AreaCounts) -> bool {
        // Units that are not region codes (names, group ids) are kept
        RegionId::parse(counts.unit.as_str()).map_or(true, |region| !self.excludes(&region))
    }
}
