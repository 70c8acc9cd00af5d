//! Exhaustive lag-correlation scan
//!
//! Each shift is a pure function of the input: shift the exposure, join it
//! to the outcome and compute the statistics battery. Shifts run in
//! parallel and the table is sorted once all of them are done.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::algorithm::statistics::{
    MutualInfoEstimator, kendall_tau_b, or_sentinel, pearson, polynomial_r2, slope, spearman,
};
use crate::config::ScanConfig;
use crate::models::LagCandidate;
use crate::utils::logging::progress;

use super::input::ScanInput;
use super::shift::{OutcomeIndex, split_points};

/// A shift dropped for an insufficient sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardedShift {
    /// Shift amount
    pub shift: i32,
    /// Matched pairs found
    pub matched: usize,
}

/// Outcome of a lag scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// Candidates ordered by descending Spearman correlation; undefined
    /// correlations last
    pub candidates: Vec<LagCandidate>,
    /// Shifts with too few matched pairs, ascending
    pub discarded: Vec<DiscardedShift>,
    /// Shifts skipped because the deadline had passed, ascending
    pub not_evaluated: Vec<i32>,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
}

impl ScanReport {
    /// The best `n` candidates
    #[must_use]
    pub fn top(&self, n: usize) -> &[LagCandidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    /// Candidate row of a shift, if it was kept
    #[must_use]
    pub fn candidate(&self, shift: i32) -> Option<&LagCandidate> {
        self.candidates.iter().find(|c| c.shift == shift)
    }

    /// Whether every configured shift was evaluated
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.not_evaluated.is_empty()
    }
}

enum ShiftOutcome {
    Kept(LagCandidate),
    Discarded(DiscardedShift),
    NotEvaluated(i32),
}

/// Scans temporal shifts of an exposure series against an outcome series
#[derive(Debug, Clone)]
pub struct LagScanner {
    config: ScanConfig,
}

impl LagScanner {
    /// Create a scanner
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// The scan settings
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Apply the configured year window and shared-exposure filter
    #[must_use]
    pub fn prepare(&self, input: &ScanInput) -> ScanInput {
        let mut prepared = input.clone();
        if let Some((first, last)) = self.config.year_range {
            prepared = prepared.within_years(first, last);
        }
        if self.config.drop_shared_exposure {
            prepared = prepared.without_shared_exposure();
        }
        prepared
    }

    /// Evaluate every configured shift
    #[must_use]
    pub fn scan(&self, input: &ScanInput) -> ScanReport {
        let start = Instant::now();
        let input = self.prepare(input);
        let index = OutcomeIndex::new(&input.outcome);
        let shifts: Vec<i32> = self.config.shifts().collect();

        info!(
            "Scanning {} shifts over {} exposure and {} outcome observations",
            shifts.len(),
            input.exposure.len(),
            input.outcome.len()
        );

        let pb = progress::create_optional_progress_bar(
            shifts.len() as u64,
            Some("Scanning shifts"),
            self.config.show_progress,
        );

        let outcomes: Vec<ShiftOutcome> = shifts
            .par_iter()
            .map(|&shift| {
                let outcome = match self.config.deadline {
                    Some(deadline) if start.elapsed() >= deadline => {
                        ShiftOutcome::NotEvaluated(shift)
                    }
                    _ => self.evaluate(&input, &index, shift),
                };
                pb.inc(1);
                outcome
            })
            .collect();

        progress::finish_progress_bar(&pb, Some("Scan complete"));

        let mut report = ScanReport {
            candidates: Vec::new(),
            discarded: Vec::new(),
            not_evaluated: Vec::new(),
            elapsed: Duration::ZERO,
        };
        for outcome in outcomes {
            match outcome {
                ShiftOutcome::Kept(candidate) => report.candidates.push(candidate),
                ShiftOutcome::Discarded(discarded) => report.discarded.push(discarded),
                ShiftOutcome::NotEvaluated(shift) => report.not_evaluated.push(shift),
            }
        }
        sort_candidates(&mut report.candidates);
        report.discarded.sort_by_key(|d| d.shift);
        report.not_evaluated.sort_unstable();
        report.elapsed = start.elapsed();

        if !report.not_evaluated.is_empty() {
            warn!(
                "Scan deadline reached: {} of {} shifts not evaluated (first: {})",
                report.not_evaluated.len(),
                shifts.len(),
                report.not_evaluated[0]
            );
        }
        info!(
            "Scan finished in {:?}: {} candidates, {} shifts discarded",
            report.elapsed,
            report.candidates.len(),
            report.discarded.len()
        );
        report
    }

    fn evaluate(&self, input: &ScanInput, index: &OutcomeIndex<'_>, shift: i32) -> ShiftOutcome {
        let matched = index.count_matches(&input.exposure, shift, input.periods());
        if matched <= self.config.min_matched {
            debug!("Shift {shift}: {matched} matched pairs, discarded");
            return ShiftOutcome::Discarded(DiscardedShift { shift, matched });
        }

        let points = index.join(&input.exposure, shift, input.periods());
        let (x, y) = split_points(&points);
        ShiftOutcome::Kept(self.candidate(shift, &x, &y))
    }

    /// Statistics battery for one shift's matched sample
    ///
    /// Each statistic is computed independently; an undefined one is NaN.
    #[must_use]
    pub fn candidate(&self, shift: i32, exposure: &[f64], outcome: &[f64]) -> LagCandidate {
        let estimator = MutualInfoEstimator::new(self.config.mi_neighbors);
        let rho = spearman(exposure, outcome);
        if let Err(e) = rho {
            debug!("Shift {shift}: rank correlation undefined ({e})");
        }

        LagCandidate {
            shift,
            matched: exposure.len() as u32,
            spearman: or_sentinel(rho),
            pearson: or_sentinel(pearson(exposure, outcome)),
            kendall: or_sentinel(kendall_tau_b(exposure, outcome)),
            mutual_information: or_sentinel(estimator.estimate(exposure, outcome)),
            r2_degree2: or_sentinel(polynomial_r2(exposure, outcome, 2)),
            r2_degree3: or_sentinel(polynomial_r2(exposure, outcome, 3)),
            regression_slope: or_sentinel(slope(exposure, outcome)),
        }
    }
}

impl Default for LagScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Sort by descending Spearman correlation, NaN last, ties by shift
pub fn sort_candidates(candidates: &mut [LagCandidate]) {
    candidates.sort_by(|a, b| {
        let by_rho = match (a.spearman.is_nan(), b.spearman.is_nan()) {
            (false, false) => b.spearman.total_cmp(&a.spearman),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => Ordering::Equal,
        };
        by_rho.then(a.shift.cmp(&b.shift))
    });
}
