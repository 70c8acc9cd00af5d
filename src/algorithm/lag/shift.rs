//! Temporal shifting and the shifted exposure-outcome join

use rustc_hash::FxHashMap;

use crate::models::{MatchedPoint, Observation, SpatialUnit};

/// (year, period) reached by moving `shift` periods forward from
/// (year, period) in a calendar of `periods` periods per year
///
/// Shift 0 is the identity; shifts carry across year boundaries in both
/// directions.
#[must_use]
pub fn shift_key(year: i32, period: u32, shift: i32, periods: u32) -> (i32, u32) {
    let offset = i64::from(period) + i64::from(shift) - 1;
    let periods = i64::from(periods);
    let new_period = offset.rem_euclid(periods) + 1;
    let new_year = i64::from(year) + offset.div_euclid(periods);
    (new_year as i32, new_period as u32)
}

type JoinKey = (SpatialUnit, i32, u32);

/// Outcome observations indexed by their natural key
#[derive(Debug, Clone)]
pub struct OutcomeIndex<'a> {
    by_key: FxHashMap<JoinKey, Vec<&'a Observation>>,
}

impl<'a> OutcomeIndex<'a> {
    /// Index outcome observations on (unit, year, period)
    #[must_use]
    pub fn new(outcome: &'a [Observation]) -> Self {
        let mut by_key: FxHashMap<JoinKey, Vec<&'a Observation>> = FxHashMap::default();
        for obs in outcome {
            by_key
                .entry((obs.unit.clone(), obs.year, obs.period))
                .or_default()
                .push(obs);
        }
        Self { by_key }
    }

    /// Number of distinct outcome keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether no outcome was indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Inner join of exposure shifted by `shift` periods with the indexed
    /// outcome; a key present several times on both sides yields every
    /// combination
    #[must_use]
    pub fn join(&self, exposure: &[Observation], shift: i32, periods: u32) -> Vec<MatchedPoint> {
        let mut points = Vec::new();
        for obs in exposure {
            let (year, period) = shift_key(obs.year, obs.period, shift, periods);
            let key = (obs.unit.clone(), year, period);
            if let Some(matches) = self.by_key.get(&key) {
                points.extend(matches.iter().map(|outcome| MatchedPoint {
                    unit: outcome.unit.clone(),
                    year: outcome.year,
                    period: outcome.period,
                    exposure: obs.value,
                    outcome: outcome.value,
                }));
            }
        }
        points
    }

    /// Number of joined pairs without materialising them
    #[must_use]
    pub fn count_matches(&self, exposure: &[Observation], shift: i32, periods: u32) -> usize {
        exposure
            .iter()
            .map(|obs| {
                let (year, period) = shift_key(obs.year, obs.period, shift, periods);
                self.by_key
                    .get(&(obs.unit.clone(), year, period))
                    .map_or(0, Vec::len)
            })
            .sum()
    }
}

/// Split joined points into (exposure, outcome) vectors
#[must_use]
pub fn split_points(points: &[MatchedPoint]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.exposure, p.outcome)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shift_is_identity() {
        for period in 1..=53 {
            assert_eq!(shift_key(2017, period, 0, 53), (2017, period));
        }
        for period in 1..=12 {
            assert_eq!(shift_key(2017, period, 0, 12), (2017, period));
        }
    }

    #[test]
    fn shifts_carry_across_years() {
        assert_eq!(shift_key(2016, 12, 1, 12), (2017, 1));
        assert_eq!(shift_key(2016, 5, 39, 12), (2019, 8));
        assert_eq!(shift_key(2016, 53, 1, 53), (2017, 1));
        assert_eq!(shift_key(2016, 1, 199, 53), (2019, 41));
        assert_eq!(shift_key(2017, 1, -1, 12), (2016, 12));
    }

    #[test]
    fn join_matches_shifted_keys() {
        let exposure = vec![
            Observation::new("A", 2017, 1, 10.0),
            Observation::new("A", 2017, 2, 20.0),
            Observation::new("B", 2017, 1, 30.0),
        ];
        let outcome = vec![
            Observation::new("A", 2017, 2, 1.0),
            Observation::new("A", 2017, 3, 2.0),
            Observation::new("B", 2017, 3, 3.0),
        ];
        let index = OutcomeIndex::new(&outcome);
        let points = index.join(&exposure, 1, 12);
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].exposure, points[0].outcome), (10.0, 1.0));
        assert_eq!((points[1].exposure, points[1].outcome), (20.0, 2.0));
        assert_eq!(index.count_matches(&exposure, 2, 12), 2);
    }
}
