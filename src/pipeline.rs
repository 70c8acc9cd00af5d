//! Batch driver
//!
//! Runs the calendar normalizer, imputer and clusterer over whole incidence
//! tables, turns observed case counts into per-capita rates paired with an
//! exposure table, and runs the lag scanner over paired tables. Each input
//! file is an independent unit of work; a failure in one file never stops
//! the others.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::algorithm::calendar::{DuplicateRecord, completeness_records, normalize_all};
use crate::algorithm::clustering::RegionClusterer;
use crate::algorithm::imputation::{ImputationOutcome, Imputer, SeriesStore};
use crate::algorithm::lag::{LagScanner, ScanInput, ScanReport, correlate_by_year, inspect_top};
use crate::algorithm::population::{
    aggregate_by_group, label_by_name, pair_with_exposure, region_rates, series_rates,
};
use crate::config::{AnalysisConfig, RateInputs, ScanConfig, SpatialJoin};
use crate::error::util::ensure_directory;
use crate::error::{IncidenceError, Result};
use crate::models::{
    AssignmentRecord, ClusterAssignment, ClusterLabel, ClusterSummary, CompletenessRecord, LagDetail,
    Observation, PairedRow, PeriodSeries, PopulationTable, RegionGroups, RegionNames, SeriesKey,
    SeriesRecord, SparseRow, SummaryRecord, YearCorrelation,
};
use crate::utils::io::{
    read_exposure, read_incidence, read_names, read_paired, read_population, write_records,
};
use crate::utils::logging::log_stage;

const INCIDENCE_STEPS: usize = 4;

/// Everything produced from one incidence table
#[derive(Debug, Default)]
pub struct IncidenceReport {
    /// Name of the source table
    pub source: String,
    /// Rows removed by the region filter
    pub filtered_rows: usize,
    /// Observed period count per (region, year)
    pub completeness: Vec<CompletenessRecord>,
    /// Completed and unqualified series
    pub series: SeriesStore,
    /// Series with too few observations to impute
    pub unqualified: Vec<SeriesKey>,
    /// Per-region cluster labels, ordered by year then region
    ///
    /// Series rejected by the calendar are placed in the insufficient
    /// cluster of their year.
    pub assignments: Vec<ClusterAssignment>,
    /// Per-cluster summaries, ordered by year then label
    pub summaries: Vec<ClusterSummary>,
    /// Periods present in more than one source row
    pub duplicates: Vec<DuplicateRecord>,
    /// Series dropped under the reject duplicate policy
    pub rejected: Vec<(SeriesKey, IncidenceError)>,
}

impl IncidenceReport {
    /// Output rows of the completed series table
    #[must_use]
    pub fn series_records(&self, include_unqualified: bool) -> Vec<SeriesRecord> {
        self.series.records(include_unqualified)
    }

    /// Output rows of the cluster assignment table
    #[must_use]
    pub fn assignment_records(&self) -> Vec<AssignmentRecord> {
        self.assignments.iter().map(AssignmentRecord::from).collect()
    }

    /// Output rows of the cluster summary table
    #[must_use]
    pub fn summary_records(&self) -> Vec<SummaryRecord> {
        self.summaries.iter().map(SummaryRecord::from).collect()
    }

    /// One-line summary for logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} series ({} unqualified), {} assignments, {} clusters, {} duplicate periods, {} rejected",
            self.series.len(),
            self.unqualified.len(),
            self.assignments.len(),
            self.summaries.len(),
            self.duplicates.len(),
            self.rejected.len()
        )
    }

    /// Write the series, completeness, cluster and duplicate tables to
    /// `output_dir`, file names prefixed with `stem`
    ///
    /// Returns the written paths.
    pub fn write(&self, output_dir: &Path, stem: &str, include_unqualified: bool) -> Result<Vec<PathBuf>> {
        ensure_directory(output_dir, "output directory")?;
        let path = |suffix: &str| output_dir.join(format!("{stem}_{suffix}.parquet"));

        let written = vec![
            path("series"),
            path("completeness"),
            path("clusters"),
            path("cluster_summary"),
            path("duplicates"),
        ];
        write_records(&written[0], &self.series_records(include_unqualified))?;
        write_records(&written[1], &self.completeness)?;
        write_records(&written[2], &self.assignment_records())?;
        write_records(&written[3], &self.summary_records())?;
        write_records(&written[4], &self.duplicates)?;
        Ok(written)
    }
}

/// Run normalization, imputation and clustering over one incidence table
///
/// Never fails: per-series problems are recorded in the report and logged.
#[must_use]
pub fn process_incidence(source: &str, mut rows: Vec<SparseRow>, config: &AnalysisConfig) -> IncidenceReport {
    let start = Instant::now();
    let kind = config.period_kind;
    info!("Processing {} incidence rows from {source}", rows.len());

    // Step 1: Region filter and completeness audit
    log_stage(source, &format!("Step 1/{INCIDENCE_STEPS}"), "filtering regions");
    let filtered_rows = config.region_filter.retain(&mut rows);
    let completeness = completeness_records(source, &rows, kind);

    // Step 2: Calendar normalization
    log_stage(source, &format!("Step 2/{INCIDENCE_STEPS}"), "normalizing calendars");
    let calendar = normalize_all(&rows, kind, config.imputation.duplicate_policy);
    for (key, error) in &calendar.rejected {
        warn!("[{source}] series {key} rejected: {error}");
    }

    // Step 3: Imputation
    log_stage(source, &format!("Step 3/{INCIDENCE_STEPS}"), "imputing series");
    let imputer = Imputer::new(config.imputation.clone());
    let outcomes: Vec<ImputationOutcome> = calendar
        .series
        .into_par_iter()
        .map(|dense| imputer.impute(dense))
        .collect();
    let series: SeriesStore = outcomes.into_iter().collect();
    let unqualified = series.unqualified_keys();

    // Step 4: Clustering
    log_stage(source, &format!("Step 4/{INCIDENCE_STEPS}"), "clustering regions");
    let clusterer = RegionClusterer::new(config.clustering.clone());
    let mut assignments = Vec::new();
    let mut summaries = Vec::new();
    for year in clusterer.cluster_store(&series) {
        assignments.extend(year.assignments);
        summaries.extend(year.summaries);
    }
    assign_rejected(&calendar.rejected, &mut assignments, &mut summaries);

    let report = IncidenceReport {
        source: source.to_string(),
        filtered_rows,
        completeness,
        series,
        unqualified,
        assignments,
        summaries,
        duplicates: calendar.duplicates,
        rejected: calendar.rejected,
    };
    info!("[{source}] done in {:?}: {}", start.elapsed(), report.summary());
    report
}

/// Add series rejected by the calendar to the insufficient cluster of their
/// year; they carry no values, so the cluster mean is unchanged
fn assign_rejected(
    rejected: &[(SeriesKey, IncidenceError)],
    assignments: &mut Vec<ClusterAssignment>,
    summaries: &mut Vec<ClusterSummary>,
) {
    if rejected.is_empty() {
        return;
    }
    for (key, _) in rejected {
        assignments.push(ClusterAssignment {
            region: key.region.clone(),
            year: key.year,
            label: ClusterLabel::Insufficient,
        });
        let sentinel = summaries
            .iter_mut()
            .find(|s| s.year == key.year && s.label == ClusterLabel::Insufficient);
        match sentinel {
            Some(summary) => {
                summary.members.push(key.region.clone());
                summary.members.sort();
            }
            None => summaries.push(ClusterSummary {
                label: ClusterLabel::Insufficient,
                year: key.year,
                members: vec![key.region.clone()],
                mean_annual_incidence: f64::NAN,
            }),
        }
    }
    assignments.sort_by(|a, b| (a.year, &a.region).cmp(&(b.year, &b.region)));
    summaries.sort_by_key(|s| s.year);
}

/// File stem used to name the outputs of `path`
#[must_use]
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "input".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Read and process one incidence table
pub fn process_file(path: &Path, config: &AnalysisConfig) -> Result<IncidenceReport> {
    let rows = read_incidence(path, &config.incidence_columns)?;
    Ok(process_incidence(&source_name(path), rows, config))
}

/// Process incidence tables in parallel
///
/// Results are returned in input order, one per file.
#[must_use]
pub fn process_batch(paths: &[PathBuf], config: &AnalysisConfig) -> Vec<(PathBuf, Result<IncidenceReport>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = process_file(path, config);
            if let Err(e) = &result {
                warn!("Failed to process {}: {e}", path.display());
            }
            (path.clone(), result)
        })
        .collect()
}

/// Results of a lag scan with the detail views of its best shifts
#[derive(Debug, Clone)]
pub struct LagReport {
    /// Candidate table and scan bookkeeping
    pub scan: ScanReport,
    /// Matched points and fits of the top candidates
    pub details: Vec<LagDetail>,
    /// Zero-lag correlation per year
    pub yearly: Vec<YearCorrelation>,
}

impl LagReport {
    /// Write the candidate table
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory(parent, "output directory")?;
        }
        write_records(path, &self.scan.candidates)
    }
}

/// Scan an exposure/outcome input and inspect its best shifts
#[must_use]
pub fn scan_input(input: &ScanInput, config: &ScanConfig) -> LagReport {
    let scanner = LagScanner::new(config.clone());
    let scan = scanner.scan(input);

    let prepared = scanner.prepare(input);
    let details = inspect_top(&prepared, &scan.candidates, config.top_n);
    let yearly = correlate_by_year(&prepared);

    if let Some(best) = scan.candidates.first() {
        info!(
            "Best shift {} with spearman {:.4} over {} pairs",
            best.shift, best.spearman, best.matched
        );
    } else {
        warn!("No shift had enough matched pairs");
    }
    if !scan.is_complete() {
        warn!("{} shifts were not evaluated before the deadline", scan.not_evaluated.len());
    }

    LagReport {
        scan,
        details,
        yearly,
    }
}

/// Scan paired rows; `source` names them in errors
pub fn scan_rows(source: &str, rows: &[PairedRow], config: &AnalysisConfig) -> Result<LagReport> {
    let input = ScanInput::from_paired(config.period_kind, rows);
    if input.exposure.is_empty() || input.outcome.is_empty() {
        return Err(IncidenceError::MissingInput(format!(
            "no complete exposure/outcome rows in {source}"
        )));
    }
    Ok(scan_input(&input, &config.scan))
}

/// Read a paired exposure/outcome table and scan it
pub fn scan_paired(path: &Path, config: &AnalysisConfig) -> Result<LagReport> {
    let rows = read_paired(path, &config.exposure_columns)?;
    scan_rows(&path.display().to_string(), &rows, config)
}

/// Population, exposure and naming tables shared by every incidence table
/// of a run
#[derive(Debug, Clone)]
pub struct RateTables {
    /// Insured population per (region, year)
    pub population: PopulationTable,
    /// Exposure observations
    pub exposure: Vec<Observation>,
    /// Place names, used by the name join
    pub names: RegionNames,
    /// Region groups, used by the group join
    pub groups: RegionGroups,
    /// Spatial level of the join
    pub join: SpatialJoin,
    /// Rate the completed series instead of the observed periods
    pub use_completed: bool,
}

impl RateTables {
    /// Read the tables named by `inputs`
    pub fn load(inputs: &RateInputs, config: &AnalysisConfig) -> Result<Self> {
        let population = read_population(&inputs.population, &config.population_columns)?;
        let exposure = read_exposure(&inputs.exposure, &config.exposure_columns)?;
        let names = match (&inputs.names, inputs.join) {
            (Some(path), _) => read_names(path, &config.name_columns)?,
            (None, SpatialJoin::Name) => {
                return Err(IncidenceError::MissingInput(
                    "the name join needs a names table".to_string(),
                ));
            }
            (None, _) => RegionNames::new(),
        };
        info!(
            "Loaded {} population entries, {} exposure observations and {} place names",
            population.len(),
            exposure.len(),
            names.len()
        );
        Ok(Self {
            population,
            exposure,
            names,
            groups: RegionGroups::reference(),
            join: inputs.join,
            use_completed: inputs.use_completed,
        })
    }

    /// Outcome rates left-joined with exposure
    ///
    /// Only observed periods are rated unless `use_completed` is set, in
    /// which case the completed series are rated and unqualified ones are
    /// left out.
    #[must_use]
    pub fn pair(&self, series: &SeriesStore) -> Vec<PairedRow> {
        let rates = if self.use_completed {
            let completed: Vec<PeriodSeries> = series.complete_series().cloned().collect();
            series_rates(&completed, &self.population)
        } else {
            region_rates(&series.observed_rows(), &self.population)
        };
        let rates = match self.join {
            SpatialJoin::Region => rates,
            SpatialJoin::Name => label_by_name(&rates, &self.names),
            SpatialJoin::Group => aggregate_by_group(&rates, &self.groups),
        };
        pair_with_exposure(&rates, &self.exposure)
    }
}
