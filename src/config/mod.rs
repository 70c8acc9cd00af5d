//! Configuration for incidence analysis.
//!
//! Every threshold of the reference deployment is a default here and can be
//! overridden from a JSON file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algorithm::population::RegionFilter;
use crate::error::{IncidenceError, Result};
use crate::error::util::safe_read_to_string;
use crate::models::PeriodKind;

/// How to resolve several source rows for the same (region, year, period)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail the series with an error
    Reject,
    /// Add the counts (merging sub-populations such as sex strata)
    Sum,
    /// Keep the last row in input order
    #[default]
    LastWins,
}

/// Configuration of calendar completion and imputation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Minimum observed periods for a series to be imputed
    pub low_threshold: usize,
    /// Resolution of duplicate source rows
    pub duplicate_policy: DuplicatePolicy,
    /// Also emit gap-marked rows for unqualified series
    pub emit_unqualified_rows: bool,
}

impl ImputationConfig {
    /// Defaults for a calendar: impute when at least half the periods are
    /// observed (27 of 53 weeks, 6 of 12 months)
    #[must_use]
    pub fn for_kind(kind: PeriodKind) -> Self {
        Self {
            low_threshold: kind.periods().div_ceil(2) as usize,
            duplicate_policy: DuplicatePolicy::default(),
            emit_unqualified_rows: false,
        }
    }
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self::for_kind(PeriodKind::Weekly)
    }
}

/// Configuration of the shape clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of ranked clusters
    pub k: usize,
    /// Seed of the centroid initialisation
    pub seed: u64,
    /// Maximum Lloyd iterations
    pub max_iterations: usize,
    /// Relative centroid-shift tolerance that stops the iterations
    pub tolerance: f64,
    /// Cluster imputed series alongside the originally complete ones
    pub include_imputed: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 5,
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            include_imputed: false,
        }
    }
}

/// Configuration of the lag-correlation scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// First shift evaluated (inclusive)
    pub min_shift: i32,
    /// Last shift evaluated (inclusive)
    pub max_shift: i32,
    /// A shift is kept only if strictly more pairs than this match
    pub min_matched: usize,
    /// Inclusive year window applied to both series before scanning
    pub year_range: Option<(i32, i32)>,
    /// Neighbour count of the mutual-information estimator
    pub mi_neighbors: usize,
    /// Number of top-ranked shifts inspected in detail
    pub top_n: usize,
    /// Wall-clock budget for the scan; shifts not started in time are skipped
    pub deadline: Option<Duration>,
    /// Show a progress bar while scanning
    pub show_progress: bool,
    /// Drop observations whose exposure value is shared with another one
    pub drop_shared_exposure: bool,
}

impl ScanConfig {
    /// Weekly scan: shifts 1..=199 over 2016-2019
    #[must_use]
    pub fn weekly() -> Self {
        Self {
            min_shift: 1,
            max_shift: 199,
            ..Self::monthly()
        }
    }

    /// Monthly scan: shifts 0..=39 over 2016-2019
    #[must_use]
    pub fn monthly() -> Self {
        Self {
            min_shift: 0,
            max_shift: 39,
            min_matched: 10,
            year_range: Some((2016, 2019)),
            mi_neighbors: 3,
            top_n: 5,
            deadline: None,
            show_progress: false,
            drop_shared_exposure: false,
        }
    }

    /// Default scan for a calendar
    #[must_use]
    pub fn for_kind(kind: PeriodKind) -> Self {
        match kind {
            PeriodKind::Weekly => Self::weekly(),
            PeriodKind::Monthly => Self::monthly(),
        }
    }

    /// Shifts to evaluate, in ascending order
    #[must_use]
    pub fn shifts(&self) -> std::ops::RangeInclusive<i32> {
        self.min_shift..=self.max_shift
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::weekly()
    }
}

/// Column names of the sparse incidence table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidenceColumns {
    /// Region code column
    pub region: String,
    /// Year column
    pub year: String,
    /// Period index column
    pub period: String,
    /// Case count column
    pub count: String,
}

impl IncidenceColumns {
    /// Reference column names for a calendar
    #[must_use]
    pub fn for_kind(kind: PeriodKind) -> Self {
        Self {
            region: "ID1_CITY".to_string(),
            year: "year".to_string(),
            period: match kind {
                PeriodKind::Weekly => "week",
                PeriodKind::Monthly => "month",
            }
            .to_string(),
            count: "case_c".to_string(),
        }
    }
}

impl Default for IncidenceColumns {
    fn default() -> Self {
        Self::for_kind(PeriodKind::Weekly)
    }
}

/// Column names of the population table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationColumns {
    /// Region code column
    pub region: String,
    /// Year column
    pub year: String,
    /// Total insured population column
    pub population: String,
}

impl Default for PopulationColumns {
    fn default() -> Self {
        Self {
            region: "ID1_CITY".to_string(),
            year: "year".to_string(),
            population: "total_pop".to_string(),
        }
    }
}

/// Column names of the region code-to-name table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NameColumns {
    /// Region code column
    pub region: String,
    /// Place name column
    pub name: String,
}

impl Default for NameColumns {
    fn default() -> Self {
        Self {
            region: "ID1_CITY".to_string(),
            name: "C_NAME".to_string(),
        }
    }
}

/// Column names of exposure and paired exposure/outcome tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureColumns {
    /// Spatial unit column (place name or group id)
    pub unit: String,
    /// Year column
    pub year: String,
    /// Period index column
    pub period: String,
    /// Exposure value column
    pub exposure: String,
    /// Outcome rate column (paired tables only)
    pub outcome: String,
}

impl ExposureColumns {
    /// Reference column names for a calendar
    #[must_use]
    pub fn for_kind(kind: PeriodKind) -> Self {
        let (unit, period) = match kind {
            PeriodKind::Weekly => ("town", "week"),
            PeriodKind::Monthly => ("region", "month"),
        };
        Self {
            unit: unit.to_string(),
            year: "year".to_string(),
            period: period.to_string(),
            exposure: "PM2.5".to_string(),
            outcome: "case_per_capita(‰)".to_string(),
        }
    }
}

impl Default for ExposureColumns {
    fn default() -> Self {
        Self::for_kind(PeriodKind::Weekly)
    }
}

/// Spatial level at which case rates meet the exposure table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SpatialJoin {
    /// Region codes on both sides
    #[default]
    Region,
    /// Region codes relabelled with place names
    Name,
    /// Regions summed into exposure zones
    Group,
}

/// Tables that turn case counts into paired rate/exposure rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateInputs {
    /// Insured population per (region, year)
    pub population: PathBuf,
    /// Exposure values per (unit, year, period)
    pub exposure: PathBuf,
    /// Region code to place name table, required for the name join
    pub names: Option<PathBuf>,
    /// Spatial level of the join
    pub join: SpatialJoin,
    /// Take counts from the completed series instead of the observed rows
    pub use_completed: bool,
}

/// Top-level configuration of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Calendar granularity of all inputs
    pub period_kind: PeriodKind,
    /// Imputation settings
    pub imputation: ImputationConfig,
    /// Clustering settings
    pub clustering: ClusteringConfig,
    /// Lag-scan settings
    pub scan: ScanConfig,
    /// Regions excluded before any processing
    pub region_filter: RegionFilter,
    /// Incidence table columns
    pub incidence_columns: IncidenceColumns,
    /// Population table columns
    pub population_columns: PopulationColumns,
    /// Name table columns
    pub name_columns: NameColumns,
    /// Exposure and paired table columns
    pub exposure_columns: ExposureColumns,
    /// Directory receiving output tables
    pub output_dir: PathBuf,
    /// Paired exposure/outcome tables to scan
    pub paired_inputs: Vec<PathBuf>,
    /// Build and scan paired tables from each processed incidence table
    pub rate_inputs: Option<RateInputs>,
    /// Size of the worker pool (defaults to the number of CPUs)
    pub num_threads: Option<usize>,
}

impl AnalysisConfig {
    /// Defaults for a calendar granularity
    #[must_use]
    pub fn for_kind(kind: PeriodKind) -> Self {
        Self {
            period_kind: kind,
            imputation: ImputationConfig::for_kind(kind),
            clustering: ClusteringConfig::default(),
            scan: ScanConfig::for_kind(kind),
            region_filter: RegionFilter::default(),
            incidence_columns: IncidenceColumns::for_kind(kind),
            population_columns: PopulationColumns::default(),
            name_columns: NameColumns::default(),
            exposure_columns: ExposureColumns::for_kind(kind),
            output_dir: PathBuf::from("output"),
            paired_inputs: Vec::new(),
            rate_inputs: None,
            num_threads: None,
        }
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "analysis configuration")?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration from JSON text
    ///
    /// Fields absent from the JSON take the defaults of the calendar named
    /// by `period_kind` (weekly when absent).
    pub fn from_json_str(content: &str) -> Result<Self> {
        let overlay: serde_json::Value = serde_json::from_str(content)?;
        let kind = match overlay.get("period_kind") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => PeriodKind::default(),
        };

        let mut merged = serde_json::to_value(Self::for_kind(kind))?;
        merge_json(&mut merged, overlay);

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let periods = self.period_kind.periods() as usize;
        if self.imputation.low_threshold == 0 || self.imputation.low_threshold > periods {
            return Err(IncidenceError::Config(format!(
                "low_threshold must be in 1..={periods}, got {}",
                self.imputation.low_threshold
            )));
        }
        if self.clustering.k == 0 {
            return Err(IncidenceError::Config("k must be at least 1".to_string()));
        }
        if self.clustering.max_iterations == 0 {
            return Err(IncidenceError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.scan.min_shift > self.scan.max_shift {
            return Err(IncidenceError::Config(format!(
                "empty shift range {}..={}",
                self.scan.min_shift, self.scan.max_shift
            )));
        }
        if self.scan.mi_neighbors == 0 {
            return Err(IncidenceError::Config(
                "mi_neighbors must be at least 1".to_string(),
            ));
        }
        if let Some((first, last)) = self.scan.year_range {
            if first > last {
                return Err(IncidenceError::Config(format!(
                    "empty year range {first}..={last}"
                )));
            }
        }
        if let Some(inputs) = &self.rate_inputs {
            if inputs.join == SpatialJoin::Name && inputs.names.is_none() {
                return Err(IncidenceError::Config(
                    "the name join needs a names table".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Number of worker threads to use
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_kind(PeriodKind::Weekly)
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Configuration:")?;
        writeln!(
            f,
            "  Calendar: {} ({} periods)",
            self.period_kind,
            self.period_kind.periods()
        )?;
        writeln!(f, "  Imputation Threshold: {}", self.imputation.low_threshold)?;
        writeln!(f, "  Duplicate Policy: {:?}", self.imputation.duplicate_policy)?;
        writeln!(
            f,
            "  Clusters: k={} seed={} include_imputed={}",
            self.clustering.k, self.clustering.seed, self.clustering.include_imputed
        )?;
        writeln!(
            f,
            "  Shifts: {}..={} (matched > {})",
            self.scan.min_shift, self.scan.max_shift, self.scan.min_matched
        )?;
        if let Some((first, last)) = self.scan.year_range {
            writeln!(f, "  Years: {first}..={last}")?;
        }
        if let Some(deadline) = self.scan.deadline {
            writeln!(f, "  Scan Deadline: {deadline:?}")?;
        }
        if let Some(inputs) = &self.rate_inputs {
            writeln!(
                f,
                "  Rates: {} joined by {:?} with {} ({} counts)",
                inputs.population.display(),
                inputs.join,
                inputs.exposure.display(),
                if inputs.use_completed { "completed" } else { "observed" }
            )?;
        }
        writeln!(f, "  Output Directory: {}", self.output_dir.display())?;
        Ok(())
    }
}

/// Recursively overlay `overlay` onto `base`; objects merge key by key,
/// every other value replaces the base value
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_defaults_match_reference() {
        let config = AnalysisConfig::default();
        assert_eq!(config.imputation.low_threshold, 27);
        assert_eq!(config.clustering.k, 5);
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.scan.shifts().next(), Some(1));
        assert_eq!(config.scan.shifts().last(), Some(199));
        assert_eq!(config.incidence_columns.period, "week");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn monthly_defaults() {
        let config = AnalysisConfig::for_kind(PeriodKind::Monthly);
        assert_eq!(config.imputation.low_threshold, 6);
        assert_eq!(config.scan.shifts().count(), 40);
        assert_eq!(config.exposure_columns.unit, "region");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "clustering": { "k": 3 }, "imputation": { "duplicate_policy": "sum" } }"#,
        )
        .unwrap();
        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.imputation.duplicate_policy, DuplicatePolicy::Sum);
        assert_eq!(config.imputation.low_threshold, 27);
    }

    #[test]
    fn monthly_json_uses_monthly_defaults() {
        let config =
            AnalysisConfig::from_json_str(r#"{ "period_kind": "monthly", "scan": { "top_n": 3 } }"#)
                .unwrap();
        assert_eq!(config.imputation.low_threshold, 6);
        assert_eq!(config.scan.min_shift, 0);
        assert_eq!(config.scan.max_shift, 39);
        assert_eq!(config.scan.top_n, 3);
        assert_eq!(config.incidence_columns.period, "month");
    }

    #[test]
    fn rate_inputs_overlay() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "rate_inputs": { "population": "pop.parquet", "exposure": "pm25.parquet", "join": "group" } }"#,
        )
        .unwrap();
        let inputs = config.rate_inputs.unwrap();
        assert_eq!(inputs.join, SpatialJoin::Group);
        assert_eq!(inputs.population, PathBuf::from("pop.parquet"));
        assert!(inputs.names.is_none());
        assert!(!inputs.use_completed);

        let by_name =
            AnalysisConfig::from_json_str(r#"{ "rate_inputs": { "join": "name" } }"#);
        assert!(matches!(by_name, Err(IncidenceError::Config(_))));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut config = AnalysisConfig::default();
        config.scan.min_shift = 10;
        config.scan.max_shift = 2;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.imputation.low_threshold = 60;
        assert!(config.validate().is_err());
    }
}
