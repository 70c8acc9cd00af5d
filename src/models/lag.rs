//! Exposure/outcome observations and lag-scan results

use serde::{Deserialize, Serialize};

use crate::models::types::SpatialUnit;

/// A numeric value at (spatial unit, year, period)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Spatial unit (region code, place name or group id)
    pub unit: SpatialUnit,
    /// Calendar year
    pub year: i32,
    /// Period index in `1..=P`
    pub period: u32,
    /// Exposure concentration or outcome rate
    pub value: f64,
}

impl Observation {
    /// Create an observation
    pub fn new(unit: impl AsRef<str>, year: i32, period: u32, value: f64) -> Self {
        Self {
            unit: SpatialUnit::new(unit),
            year,
            period,
            value,
        }
    }
}

/// A row carrying both an outcome rate and an exposure value, either of
/// which may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedRow {
    /// Spatial unit
    pub unit: SpatialUnit,
    /// Calendar year
    pub year: i32,
    /// Period index
    pub period: u32,
    /// Outcome rate (cases per 1000)
    pub outcome: Option<f64>,
    /// Exposure value
    pub exposure: Option<f64>,
}

/// Association statistics for one temporal shift
///
/// Statistics that could not be computed (degenerate input) hold NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagCandidate {
    /// Number of periods the exposure was shifted forward
    pub shift: i32,
    /// Number of matched (exposure, outcome) pairs
    pub matched: u32,
    /// Spearman rank correlation
    pub spearman: f64,
    /// Pearson linear correlation
    pub pearson: f64,
    /// Kendall tau-b concordance
    pub kendall: f64,
    /// k-nearest-neighbour mutual information estimate (nats)
    pub mutual_information: f64,
    /// Coefficient of determination of a degree-2 polynomial fit
    pub r2_degree2: f64,
    /// Coefficient of determination of a degree-3 polynomial fit
    pub r2_degree3: f64,
    /// Least-squares slope of outcome on exposure
    pub regression_slope: f64,
}

/// Straight line `outcome = intercept + slope * exposure`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    /// Intercept
    pub intercept: f64,
    /// Slope
    pub slope: f64,
}

impl FittedLine {
    /// Evaluate the line at `x`
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// A matched pair behind a lag candidate
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPoint {
    /// Spatial unit of the outcome
    pub unit: SpatialUnit,
    /// Outcome year
    pub year: i32,
    /// Outcome period
    pub period: u32,
    /// Shifted exposure value
    pub exposure: f64,
    /// Outcome rate
    pub outcome: f64,
}

/// Detailed view of one top-ranked shift
#[derive(Debug, Clone, PartialEq)]
pub struct LagDetail {
    /// 1-based rank in the candidate table
    pub rank: usize,
    /// The candidate row
    pub candidate: LagCandidate,
    /// Matched pairs ordered by (unit, year, period)
    pub points: Vec<MatchedPoint>,
    /// Linear fit over all points
    pub overall_fit: Option<FittedLine>,
    /// Linear fit per spatial unit (units with a degenerate fit are absent)
    pub unit_fits: Vec<(SpatialUnit, FittedLine)>,
}

/// Zero-lag association for one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCorrelation {
    /// Calendar year
    pub year: i32,
    /// Number of paired observations
    pub samples: u32,
    /// Pearson correlation
    pub pearson: f64,
    /// Spearman correlation
    pub spearman: f64,
    /// Kendall tau-b
    pub kendall: f64,
}
