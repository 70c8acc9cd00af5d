//! Exposure and outcome series prepared for a lag scan

use std::collections::BTreeSet;

use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::models::{Observation, PairedRow, PeriodKind, SpatialUnit};

/// Exposure and outcome series on the same spatial partitioning
#[derive(Debug, Clone, PartialEq)]
pub struct ScanInput {
    /// Calendar of both series
    pub kind: PeriodKind,
    /// Exposure observations (shifted during the scan)
    pub exposure: Vec<Observation>,
    /// Outcome rate observations (never shifted)
    pub outcome: Vec<Observation>,
}

impl ScanInput {
    /// Create an input from two separate series
    #[must_use]
    pub fn new(kind: PeriodKind, exposure: Vec<Observation>, outcome: Vec<Observation>) -> Self {
        Self {
            kind,
            exposure,
            outcome,
        }
    }

    /// Build both series from rows carrying exposure and outcome together
    ///
    /// Rows missing either value are dropped.
    #[must_use]
    pub fn from_paired(kind: PeriodKind, rows: &[PairedRow]) -> Self {
        let (exposure, outcome): (Vec<Observation>, Vec<Observation>) = rows
            .iter()
            .filter_map(|row| {
                let (exposure, outcome) = (row.exposure?, row.outcome?);
                let at = |value| Observation {
                    unit: row.unit.clone(),
                    year: row.year,
                    period: row.period,
                    value,
                };
                Some((at(exposure), at(outcome)))
            })
            .unzip();

        let dropped = rows.len() - exposure.len();
        if dropped > 0 {
            warn!("Dropped {dropped} paired rows with a missing exposure or outcome value");
        }
        Self::new(kind, exposure, outcome)
    }

    /// Keep only observations of years within `first..=last`
    #[must_use]
    pub fn within_years(mut self, first: i32, last: i32) -> Self {
        let in_range = |obs: &Observation| (first..=last).contains(&obs.year);
        self.exposure.retain(in_range);
        self.outcome.retain(in_range);
        self
    }

    /// Remove exposure observations whose value occurs more than once,
    /// together with the outcome observations at the same keys
    #[must_use]
    pub fn without_shared_exposure(mut self) -> Self {
        let mut occurrences: FxHashMap<u64, usize> = FxHashMap::default();
        for obs in &self.exposure {
            *occurrences.entry(normalized_bits(obs.value)).or_insert(0) += 1;
        }

        let removed: BTreeSet<(SpatialUnit, i32, u32)> = self
            .exposure
            .iter()
            .filter(|obs| occurrences[&normalized_bits(obs.value)] > 1)
            .map(|obs| (obs.unit.clone(), obs.year, obs.period))
            .collect();

        if !removed.is_empty() {
            info!(
                "Removing {} observations with a shared exposure value",
                removed.len()
            );
            let keep = |obs: &Observation| {
                !removed.contains(&(obs.unit.clone(), obs.year, obs.period))
            };
            self.exposure.retain(keep);
            self.outcome.retain(keep);
        }
        self
    }

    /// Periods per year of the calendar
    #[must_use]
    pub fn periods(&self) -> u32 {
        self.kind.periods()
    }

    /// Distinct spatial units of the outcome series
    #[must_use]
    pub fn units(&self) -> BTreeSet<&SpatialUnit> {
        self.outcome.iter().map(|o| &o.unit).collect()
    }
}

/// Bit pattern of a value with both zeros identified
fn normalized_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(unit: &str, period: u32, outcome: Option<f64>, exposure: Option<f64>) -> PairedRow {
        PairedRow {
            unit: SpatialUnit::new(unit),
            year: 2017,
            period,
            outcome,
            exposure,
        }
    }

    #[test]
    fn paired_rows_drop_missing_values() {
        let rows = vec![
            paired("A", 1, Some(1.0), Some(10.0)),
            paired("A", 2, None, Some(11.0)),
            paired("A", 3, Some(3.0), None),
        ];
        let input = ScanInput::from_paired(PeriodKind::Monthly, &rows);
        assert_eq!(input.exposure.len(), 1);
        assert_eq!(input.outcome.len(), 1);
        assert_eq!(input.outcome[0].value, 1.0);
    }

    #[test]
    fn year_window_applies_to_both_series() {
        let input = ScanInput::new(
            PeriodKind::Monthly,
            vec![
                Observation::new("A", 2015, 1, 1.0),
                Observation::new("A", 2016, 1, 1.0),
            ],
            vec![
                Observation::new("A", 2019, 1, 1.0),
                Observation::new("A", 2020, 1, 1.0),
            ],
        )
        .within_years(2016, 2019);
        assert_eq!(input.exposure.len(), 1);
        assert_eq!(input.outcome.len(), 1);
        assert_eq!(input.outcome[0].year, 2019);
    }

    #[test]
    fn shared_exposure_values_are_removed() {
        let rows = vec![
            paired("A", 1, Some(1.0), Some(10.0)),
            paired("A", 2, Some(2.0), Some(10.0)),
            paired("A", 3, Some(3.0), Some(12.0)),
        ];
        let input = ScanInput::from_paired(PeriodKind::Monthly, &rows).without_shared_exposure();
        assert_eq!(input.exposure.len(), 1);
        assert_eq!(input.outcome.len(), 1);
        assert_eq!(input.outcome[0].period, 3);
    }
}
