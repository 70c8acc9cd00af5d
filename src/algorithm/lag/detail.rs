//! Detailed view of the top-ranked shifts: matched points and linear fits
//! overall and per spatial unit

use itertools::Itertools;
use log::debug;

use crate::algorithm::statistics::linear_fit;
use crate::models::{LagCandidate, LagDetail, MatchedPoint};

use super::input::ScanInput;
use super::shift::{OutcomeIndex, split_points};

/// Inspect the first `n` candidates of a ranked table
///
/// `input` must be the input the table was scanned from, after the same
/// year window and filters.
#[must_use]
pub fn inspect_top(input: &ScanInput, candidates: &[LagCandidate], n: usize) -> Vec<LagDetail> {
    let index = OutcomeIndex::new(&input.outcome);

    candidates
        .iter()
        .take(n)
        .enumerate()
        .map(|(idx, candidate)| {
            let mut points = index.join(&input.exposure, candidate.shift, input.periods());
            points.sort_by(|a, b| {
                (&a.unit, a.year, a.period)
                    .cmp(&(&b.unit, b.year, b.period))
                    .then(a.exposure.total_cmp(&b.exposure))
            });

            let (x, y) = split_points(&points);
            let overall_fit = linear_fit(&x, &y).ok();

            let unit_fits = points
                .iter()
                .chunk_by(|p| p.unit.clone())
                .into_iter()
                .filter_map(|(unit, group)| {
                    let group: Vec<&MatchedPoint> = group.collect();
                    let x: Vec<f64> = group.iter().map(|p| p.exposure).collect();
                    let y: Vec<f64> = group.iter().map(|p| p.outcome).collect();
                    match linear_fit(&x, &y) {
                        Ok(line) => Some((unit, line)),
                        Err(e) => {
                            debug!("Shift {}: no fit for {unit} ({e})", candidate.shift);
                            None
                        }
                    }
                })
                .collect();

            LagDetail {
                rank: idx + 1,
                candidate: candidate.clone(),
                points,
                overall_fit,
                unit_fits,
            }
        })
        .collect()
}
