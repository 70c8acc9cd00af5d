//! Zero-lag association per calendar year

use std::collections::BTreeMap;

use crate::algorithm::statistics::{kendall_tau_b, or_sentinel, pearson, spearman};
use crate::models::YearCorrelation;

use super::input::ScanInput;
use super::shift::OutcomeIndex;

/// Pearson, Spearman and Kendall correlation of exposure and outcome at
/// the same key, one row per year in ascending order
#[must_use]
pub fn correlate_by_year(input: &ScanInput) -> Vec<YearCorrelation> {
    let index = OutcomeIndex::new(&input.outcome);
    let points = index.join(&input.exposure, 0, input.periods());

    let mut by_year: BTreeMap<i32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for point in points {
        let (x, y) = by_year.entry(point.year).or_default();
        x.push(point.exposure);
        y.push(point.outcome);
    }

    by_year
        .into_iter()
        .map(|(year, (x, y))| YearCorrelation {
            year,
            samples: x.len() as u32,
            pearson: or_sentinel(pearson(&x, &y)),
            spearman: or_sentinel(spearman(&x, &y)),
            kendall: or_sentinel(kendall_tau_b(&x, &y)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, PeriodKind};

    #[test]
    fn one_row_per_year() {
        let mut exposure = Vec::new();
        let mut outcome = Vec::new();
        for year in [2016, 2017] {
            for m in 1..=12 {
                let e = f64::from(m);
                exposure.push(Observation::new("A", year, m, e));
                let o = if year == 2016 { e } else { -e };
                outcome.push(Observation::new("A", year, m, o));
            }
        }
        let rows = correlate_by_year(&ScanInput::new(PeriodKind::Monthly, exposure, outcome));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2016);
        assert_eq!(rows[0].samples, 12);
        assert!((rows[0].spearman - 1.0).abs() < 1e-12);
        assert!((rows[1].kendall + 1.0).abs() < 1e-12);
    }
}
