//! Series imputation
//!
//! A dense series falls in one of three bands by its observed count:
//! complete (all `P` periods), imputable (at least `low_threshold`) or
//! unqualified. Only the middle band is filled.

pub mod interpolate;
pub mod store;

use std::collections::BTreeMap;

use log::debug;

use crate::config::ImputationConfig;
use crate::models::{DenseSeries, PeriodSeries, PeriodValue};

pub use interpolate::fill_gaps;
pub use store::SeriesStore;

/// Result of imputing one series
#[derive(Debug, Clone, PartialEq)]
pub enum ImputationOutcome {
    /// Every period was observed
    Complete(PeriodSeries),
    /// Gaps were filled
    Imputed(PeriodSeries),
    /// Too few observations; the gap-marked series is kept for sentinel
    /// handling downstream
    Unqualified(DenseSeries),
}

impl ImputationOutcome {
    /// The complete series, for the first two bands
    #[must_use]
    pub fn series(&self) -> Option<&PeriodSeries> {
        match self {
            Self::Complete(series) | Self::Imputed(series) => Some(series),
            Self::Unqualified(_) => None,
        }
    }

    /// Whether every period was observed before imputation
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Whether the series was too sparse to impute
    #[must_use]
    pub fn is_unqualified(&self) -> bool {
        matches!(self, Self::Unqualified(_))
    }
}

/// Applies the imputation policy to dense series
#[derive(Debug, Clone)]
pub struct Imputer {
    config: ImputationConfig,
}

impl Imputer {
    /// Create an imputer
    #[must_use]
    pub fn new(config: ImputationConfig) -> Self {
        Self { config }
    }

    /// The policy in use
    #[must_use]
    pub fn config(&self) -> &ImputationConfig {
        &self.config
    }

    /// Classify and, in the imputable band, fill a dense series
    #[must_use]
    pub fn impute(&self, dense: DenseSeries) -> ImputationOutcome {
        let observed = dense.observed_count();

        if observed < self.config.low_threshold {
            debug!(
                "{}: {observed} observed periods, below threshold {}",
                dense.key(),
                self.config.low_threshold
            );
            return ImputationOutcome::Unqualified(dense);
        }

        let Some(filled) = fill_gaps(dense.counts()) else {
            return ImputationOutcome::Unqualified(dense);
        };

        let names = dense.attribute_names();
        let values = filled
            .into_iter()
            .enumerate()
            .map(|(idx, (case_count, provenance))| {
                let period = idx as u32 + 1;
                let source = dense.attributes(period);
                let attributes: BTreeMap<String, Option<String>> = names
                    .iter()
                    .map(|name| (name.clone(), source.and_then(|a| a.get(name).cloned())))
                    .collect();
                PeriodValue {
                    period,
                    case_count,
                    provenance,
                    attributes,
                }
            })
            .collect();

        let series = PeriodSeries {
            key: dense.key().clone(),
            kind: dense.kind(),
            values,
        };

        if dense.is_complete() {
            ImputationOutcome::Complete(series)
        } else {
            debug!(
                "{}: imputed {} missing periods",
                dense.key(),
                dense.len() - observed
            );
            ImputationOutcome::Imputed(series)
        }
    }
}

impl Default for Imputer {
    fn default() -> Self {
        Self::new(ImputationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodKind, Provenance, RegionId, SeriesKey};

    fn dense(observed: std::ops::RangeInclusive<u32>) -> DenseSeries {
        let key = SeriesKey::new(RegionId::parse("1001").unwrap(), 2017);
        let mut series = DenseSeries::empty(key, PeriodKind::Weekly);
        for week in observed {
            series.set(week, u64::from(week), Default::default());
        }
        series
    }

    #[test]
    fn bands_follow_threshold() {
        let imputer = Imputer::default();
        assert!(imputer.impute(dense(1..=53)).is_complete());
        assert!(matches!(imputer.impute(dense(1..=27)), ImputationOutcome::Imputed(_)));
        assert!(imputer.impute(dense(1..=26)).is_unqualified());
    }

    #[test]
    fn trailing_weeks_are_forward_filled() {
        let outcome = Imputer::default().impute(dense(1..=43));
        let series = outcome.series().unwrap();
        assert_eq!(series.values.len(), 53);
        for value in &series.values[43..] {
            assert_eq!(value.case_count, 43);
            assert_eq!(value.provenance, Provenance::ForwardFilled);
        }
    }

    #[test]
    fn attributes_are_carried_or_nulled() {
        let key = SeriesKey::new(RegionId::parse("1001").unwrap(), 2017);
        let mut series = DenseSeries::empty(key, PeriodKind::Monthly);
        for month in 1..=11 {
            let mut attrs = crate::models::Attributes::new();
            attrs.insert("sex".to_string(), "all".to_string());
            series.set(month, 3, attrs);
        }
        let outcome = Imputer::new(ImputationConfig::for_kind(PeriodKind::Monthly)).impute(series);
        let filled = outcome.series().unwrap();
        assert_eq!(filled.values[0].attributes["sex"], Some("all".to_string()));
        assert_eq!(filled.values[11].attributes["sex"], None);
        assert_eq!(filled.values[11].provenance, Provenance::ForwardFilled);
    }
}
