//! Keyed store of imputation outcomes
//!
//! Holds at most one entry per (region, year); inserting an outcome for a
//! key replaces whatever partial entry was there.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{PeriodSeries, Provenance, SeriesKey, SeriesRecord, SparseRow};

use super::ImputationOutcome;

/// One outcome per series key, ordered by (region, year)
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    entries: BTreeMap<SeriesKey, ImputationOutcome>,
}

impl SeriesStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an outcome; returns the entry it replaced
    pub fn insert(&mut self, outcome: ImputationOutcome) -> Option<ImputationOutcome> {
        let key = match &outcome {
            ImputationOutcome::Complete(series) | ImputationOutcome::Imputed(series) => {
                series.key.clone()
            }
            ImputationOutcome::Unqualified(dense) => dense.key().clone(),
        };
        self.entries.insert(key, outcome)
    }

    /// Outcome stored for a key
    #[must_use]
    pub fn get(&self, key: &SeriesKey) -> Option<&ImputationOutcome> {
        self.entries.get(key)
    }

    /// Number of stored series
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&SeriesKey, &ImputationOutcome)> {
        self.entries.iter()
    }

    /// Distinct years present in the store
    #[must_use]
    pub fn years(&self) -> BTreeSet<i32> {
        self.entries.keys().map(|k| k.year).collect()
    }

    /// Entries of one year in region order
    pub fn year(&self, year: i32) -> impl Iterator<Item = &ImputationOutcome> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.year == year)
            .map(|(_, outcome)| outcome)
    }

    /// Complete (observed or imputed) series in key order
    pub fn complete_series(&self) -> impl Iterator<Item = &PeriodSeries> {
        self.entries.values().filter_map(ImputationOutcome::series)
    }

    /// Keys of unqualified series
    #[must_use]
    pub fn unqualified_keys(&self) -> Vec<SeriesKey> {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_unqualified())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Observed values of every stored series as source rows, ordered by
    /// key then period
    ///
    /// Filled periods are left out. Unqualified series contribute the
    /// periods they did observe, and duplicate source rows appear once as
    /// the calendar resolved them.
    #[must_use]
    pub fn observed_rows(&self) -> Vec<SparseRow> {
        let mut rows = Vec::new();
        for (key, outcome) in &self.entries {
            let row = |period: u32, count: u64| SparseRow::new(key.region.clone(), key.year, period, count);
            match outcome {
                ImputationOutcome::Complete(series) | ImputationOutcome::Imputed(series) => rows.extend(
                    series
                        .values
                        .iter()
                        .filter(|v| matches!(v.provenance, Provenance::Observed))
                        .map(|v| row(v.period, v.case_count)),
                ),
                ImputationOutcome::Unqualified(dense) => rows.extend(
                    (1u32..)
                        .zip(dense.counts())
                        .filter_map(|(period, count)| count.map(|c| row(period, c))),
                ),
            }
        }
        rows
    }

    /// Output rows for every stored series
    ///
    /// Unqualified series are only emitted when `include_unqualified` is
    /// set, with their missing periods tagged as unqualified.
    #[must_use]
    pub fn records(&self, include_unqualified: bool) -> Vec<SeriesRecord> {
        self.entries
            .values()
            .flat_map(|outcome| match outcome {
                ImputationOutcome::Complete(series) | ImputationOutcome::Imputed(series) => {
                    series.to_records()
                }
                ImputationOutcome::Unqualified(dense) if include_unqualified => {
                    dense.to_records(Provenance::Unqualified)
                }
                ImputationOutcome::Unqualified(_) => Vec::new(),
            })
            .collect()
    }
}

impl FromIterator<ImputationOutcome> for SeriesStore {
    fn from_iter<T: IntoIterator<Item = ImputationOutcome>>(iter: T) -> Self {
        let mut store = Self::new();
        for outcome in iter {
            store.insert(outcome);
        }
        store
    }
}
