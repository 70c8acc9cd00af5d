//! Gap filling over a gap-marked count vector

use crate::models::Provenance;

/// Fill every missing slot of `counts`
///
/// Interior gaps are interpolated linearly between the nearest observed
/// neighbours and rounded half-to-even afterwards. Leading gaps take the
/// first observed value and trailing gaps the last one. Returns `None` when
/// nothing is observed.
#[must_use]
pub fn fill_gaps(counts: &[Option<u64>]) -> Option<Vec<(u64, Provenance)>> {
    let observed: Vec<(usize, u64)> = counts
        .iter()
        .enumerate()
        .filter_map(|(idx, count)| count.map(|c| (idx, c)))
        .collect();

    let &(first_idx, first_value) = observed.first()?;
    let &(last_idx, last_value) = observed.last()?;

    let mut filled = Vec::with_capacity(counts.len());
    // Index into `observed` of the nearest observation at or before the slot
    let mut left = 0;

    for (idx, count) in counts.iter().enumerate() {
        if let Some(value) = count {
            filled.push((*value, Provenance::Observed));
            if observed[left].0 < idx {
                left += 1;
            }
            continue;
        }

        if idx < first_idx {
            filled.push((first_value, Provenance::BackwardFilled));
        } else if idx > last_idx {
            filled.push((last_value, Provenance::ForwardFilled));
        } else {
            let (a, va) = observed[left];
            let (b, vb) = observed[left + 1];
            let fraction = (idx - a) as f64 / (b - a) as f64;
            let value = va as f64 + (vb as f64 - va as f64) * fraction;
            filled.push((value.round_ties_even() as u64, Provenance::Interpolated));
        }
    }

    Some(filled)
}
