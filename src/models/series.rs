//! Period series at the three stages of their lifecycle
//!
//! * [`SparseRow`] - one source row as read from an incidence table
//! * [`DenseSeries`] - a gap-marked series over the full period range
//! * [`PeriodSeries`] - a complete series with a provenance tag per period

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::types::{PeriodKind, Provenance, RegionId, SeriesKey};

/// Non-count columns carried by a source row, keyed by column name
pub type Attributes = BTreeMap<String, String>;

/// One sparse incidence row: (region, year, period) -> case count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseRow {
    /// Region code
    pub region: RegionId,
    /// Calendar year
    pub year: i32,
    /// Period index in `1..=P`
    pub period: u32,
    /// Number of cases
    pub case_count: u64,
    /// Other columns of the source row
    pub attributes: Attributes,
}

impl SparseRow {
    /// Create a row without extra attributes
    #[must_use]
    pub fn new(region: RegionId, year: i32, period: u32, case_count: u64) -> Self {
        Self {
            region,
            year,
            period,
            case_count,
            attributes: Attributes::new(),
        }
    }

    /// Attach an extra attribute column
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The (region, year) key of the row
    #[must_use]
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.region.clone(), self.year)
    }
}

/// Dense, gap-marked series for one (region, year)
///
/// Slot `i` holds period `i + 1`; `None` marks a period absent from the
/// source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries {
    key: SeriesKey,
    kind: PeriodKind,
    counts: Vec<Option<u64>>,
    attributes: Vec<Option<Attributes>>,
}

impl DenseSeries {
    /// Create a series with every period missing
    #[must_use]
    pub fn empty(key: SeriesKey, kind: PeriodKind) -> Self {
        let len = kind.periods() as usize;
        Self {
            key,
            kind,
            counts: vec![None; len],
            attributes: vec![None; len],
        }
    }

    /// Build a series from per-period counts (`counts[i]` is period `i + 1`)
    ///
    /// Missing trailing slots are treated as missing periods and extra slots
    /// are ignored.
    #[must_use]
    pub fn from_counts(key: SeriesKey, kind: PeriodKind, counts: &[Option<u64>]) -> Self {
        let mut series = Self::empty(key, kind);
        for (slot, count) in series.counts.iter_mut().zip(counts) {
            *slot = *count;
        }
        series
    }

    /// Record a value for `period`; returns the previous value if the
    /// period was already observed
    pub fn set(&mut self, period: u32, count: u64, attributes: Attributes) -> Option<u64> {
        let idx = period as usize - 1;
        self.attributes[idx] = Some(attributes);
        self.counts[idx].replace(count)
    }

    /// Add to the value of `period`, treating a missing period as zero
    pub fn accumulate(&mut self, period: u32, count: u64, attributes: Attributes) {
        let idx = period as usize - 1;
        let slot = self.counts[idx].get_or_insert(0);
        *slot += count;
        self.attributes[idx].get_or_insert(attributes);
    }

    /// Series key
    #[must_use]
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    /// Calendar granularity
    #[must_use]
    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// Number of periods in the calendar
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the calendar has no periods (never true for valid kinds)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Per-period values, `None` for missing periods
    #[must_use]
    pub fn counts(&self) -> &[Option<u64>] {
        &self.counts
    }

    /// Value of `period` (1-based)
    #[must_use]
    pub fn count(&self, period: u32) -> Option<u64> {
        let idx = (period as usize).checked_sub(1)?;
        self.counts.get(idx).copied().flatten()
    }

    /// Attributes of the source row for `period`, if one existed
    #[must_use]
    pub fn attributes(&self, period: u32) -> Option<&Attributes> {
        let idx = (period as usize).checked_sub(1)?;
        self.attributes.get(idx).and_then(Option::as_ref)
    }

    /// Union of attribute names over all source rows
    #[must_use]
    pub fn attribute_names(&self) -> BTreeSet<String> {
        self.attributes
            .iter()
            .flatten()
            .flat_map(|attrs| attrs.keys().cloned())
            .collect()
    }

    /// Number of distinct observed periods
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.counts.iter().filter(|c| c.is_some()).count()
    }

    /// Whether every period is observed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.observed_count() == self.counts.len()
    }

    /// Mean of the observed values, `None` when nothing was observed
    #[must_use]
    pub fn observed_mean(&self) -> Option<f64> {
        let observed: Vec<f64> = self.counts.iter().flatten().map(|&c| c as f64).collect();
        if observed.is_empty() {
            None
        } else {
            Some(observed.iter().sum::<f64>() / observed.len() as f64)
        }
    }

    /// Output rows for this series; missing periods carry no count and the
    /// given provenance tag
    #[must_use]
    pub fn to_records(&self, missing: Provenance) -> Vec<SeriesRecord> {
        self.counts
            .iter()
            .enumerate()
            .map(|(idx, count)| SeriesRecord {
                region_id: self.key.region.to_string(),
                year: self.key.year,
                period: idx as u32 + 1,
                case_count: *count,
                provenance: match count {
                    Some(_) => Provenance::Observed,
                    None => missing,
                }
                .as_str()
                .to_string(),
            })
            .collect()
    }
}

/// One value of a complete series
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodValue {
    /// Period index in `1..=P`
    pub period: u32,
    /// Case count (observed or filled)
    pub case_count: u64,
    /// How the value was obtained
    pub provenance: Provenance,
    /// Non-count columns; `None` marks a column absent for a filled period
    pub attributes: BTreeMap<String, Option<String>>,
}

/// Complete series for one (region, year): exactly one value per period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSeries {
    /// Series key
    pub key: SeriesKey,
    /// Calendar granularity
    pub kind: PeriodKind,
    /// Values ordered by period
    pub values: Vec<PeriodValue>,
}

impl PeriodSeries {
    /// Case counts as a numeric vector ordered by period
    #[must_use]
    pub fn vector(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.case_count as f64).collect()
    }

    /// Mean of the period values (the region's period-average incidence)
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().map(|v| v.case_count as f64).sum::<f64>() / self.values.len() as f64
    }

    /// Output rows for this series
    #[must_use]
    pub fn to_records(&self) -> Vec<SeriesRecord> {
        self.values
            .iter()
            .map(|v| SeriesRecord {
                region_id: self.key.region.to_string(),
                year: self.key.year,
                period: v.period,
                case_count: Some(v.case_count),
                provenance: v.provenance.as_str().to_string(),
            })
            .collect()
    }
}

/// Output row of the completion/imputation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Region code
    pub region_id: String,
    /// Calendar year
    pub year: i32,
    /// Period index
    pub period: u32,
    /// Case count; only absent for rows of unqualified series
    pub case_count: Option<u64>,
    /// Provenance label
    pub provenance: String,
}

/// Number of distinct observed periods of one (source, region, year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessRecord {
    /// Name of the source table (disease file)
    pub source: String,
    /// Region code
    pub region_id: String,
    /// Calendar year
    pub year: i32,
    /// Distinct observed periods
    pub observed_period_count: u32,
}
