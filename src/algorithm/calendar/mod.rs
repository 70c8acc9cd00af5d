//! Calendar normalization
//!
//! Expands sparse (region, year, period, count) rows into dense, gap-marked
//! series over the full period range. Nothing is extrapolated here; a
//! period absent from the source rows stays missing.

pub mod completeness;

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::DuplicatePolicy;
use crate::error::{IncidenceError, Result};
use crate::models::{DenseSeries, PeriodKind, SeriesKey, SparseRow};

pub use completeness::{completeness_records, short_series};

/// Audit entry for a (region, year, period) present in more than one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// Region code
    pub region_id: String,
    /// Calendar year
    pub year: i32,
    /// Period index
    pub period: u32,
    /// Number of source rows for this period
    pub row_count: u32,
}

/// A dense series together with its duplicate audit
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    /// Gap-marked series
    pub series: DenseSeries,
    /// Periods resolved from several rows
    pub duplicates: Vec<DuplicateRecord>,
}

/// Result of normalizing a whole table
#[derive(Debug, Default)]
pub struct CalendarOutput {
    /// Dense series ordered by (region, year)
    pub series: Vec<DenseSeries>,
    /// Duplicate audit over all series
    pub duplicates: Vec<DuplicateRecord>,
    /// Series rejected under [`DuplicatePolicy::Reject`]
    pub rejected: Vec<(SeriesKey, IncidenceError)>,
    /// Rows skipped for an out-of-range period
    pub invalid_rows: usize,
}

/// Expand the rows of one (region, year) into a dense series
///
/// Rows with a period outside `1..=P` are skipped with a warning. Rows of
/// other keys are ignored. Duplicate periods are resolved by `policy`
/// and always listed in the audit; under [`DuplicatePolicy::Reject`] the
/// series fails with [`IncidenceError::DuplicateRows`].
pub fn normalize_series(
    key: &SeriesKey,
    kind: PeriodKind,
    rows: &[SparseRow],
    policy: DuplicatePolicy,
) -> Result<NormalizedSeries> {
    let mut series = DenseSeries::empty(key.clone(), kind);
    let mut occurrences: BTreeMap<u32, u32> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.region == key.region && r.year == key.year) {
        let period = match kind.validate(row.period) {
            Ok(period) => period,
            Err(e) => {
                warn!("Skipping row of {key}: {e}");
                continue;
            }
        };
        *occurrences.entry(period).or_insert(0) += 1;

        match policy {
            DuplicatePolicy::Sum => series.accumulate(period, row.case_count, row.attributes.clone()),
            DuplicatePolicy::LastWins | DuplicatePolicy::Reject => {
                series.set(period, row.case_count, row.attributes.clone());
            }
        }
    }

    let duplicates: Vec<DuplicateRecord> = occurrences
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(period, row_count)| DuplicateRecord {
            region_id: key.region.to_string(),
            year: key.year,
            period,
            row_count,
        })
        .collect();

    if !duplicates.is_empty() {
        if policy == DuplicatePolicy::Reject {
            return Err(IncidenceError::DuplicateRows {
                region: key.region.to_string(),
                year: key.year,
                count: duplicates.len(),
            });
        }
        warn!(
            "{key}: {} periods have duplicate rows, resolved as {policy:?}",
            duplicates.len()
        );
    }

    debug!("{key}: {} of {} periods observed", series.observed_count(), series.len());
    Ok(NormalizedSeries { series, duplicates })
}

/// Normalize every (region, year) of a table
///
/// A rejected series is reported in [`CalendarOutput::rejected`] and does
/// not stop the others.
pub fn normalize_all(rows: &[SparseRow], kind: PeriodKind, policy: DuplicatePolicy) -> CalendarOutput {
    let mut output = CalendarOutput::default();

    let invalid = rows.iter().filter(|r| kind.validate(r.period).is_err()).count();
    if invalid > 0 {
        warn!("{invalid} rows have a period outside 1..={} and are skipped", kind.periods());
    }
    output.invalid_rows = invalid;

    let grouped = rows
        .iter()
        .filter(|r| kind.validate(r.period).is_ok())
        .cloned()
        .into_group_map_by(SparseRow::key);

    for (key, group) in grouped.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        match normalize_series(&key, kind, &group, policy) {
            Ok(normalized) => {
                output.duplicates.extend(normalized.duplicates);
                output.series.push(normalized.series);
            }
            Err(e) => {
                warn!("Series {key} rejected: {e}");
                output.rejected.push((key, e));
            }
        }
    }

    output
}
