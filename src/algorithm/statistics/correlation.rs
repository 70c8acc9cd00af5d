//! Pearson, Spearman and Kendall tau-b correlation

use std::cmp::Ordering;

use super::{DegenerateInput, StatResult, check_sample, is_constant, mean};

/// Pearson linear correlation
pub fn pearson(x: &[f64], y: &[f64]) -> StatResult {
    check_sample(x, y, 2)?;
    if is_constant(x) || is_constant(y) {
        return Err(DegenerateInput::ZeroVariance);
    }

    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return Err(DegenerateInput::ZeroVariance);
    }
    Ok((sxy / denom).clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson over average ranks
pub fn spearman(x: &[f64], y: &[f64]) -> StatResult {
    check_sample(x, y, 2)?;
    pearson(&average_ranks(x), &average_ranks(y))
}

/// 1-based ranks; tied values share the mean of their ranks
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Kendall tau-b with tie correction, in O(n log n)
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> StatResult {
    check_sample(x, y, 2)?;

    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    pairs.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.total_cmp(&b.1),
        other => other,
    });

    let n = pairs.len() as u64;
    let total = n * (n - 1) / 2;
    let x_ties = tied_pairs(&pairs, |a, b| a.0 == b.0);
    let joint_ties = tied_pairs(&pairs, |a, b| a.0 == b.0 && a.1 == b.1);

    let mut ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let swaps = count_inversions(&mut ys);
    let y_ties = tied_pairs(&ys, |a, b| a == b);

    let x_untied = total - x_ties;
    let y_untied = total - y_ties;
    if x_untied == 0 || y_untied == 0 {
        return Err(DegenerateInput::ZeroVariance);
    }

    let numerator =
        total as f64 - x_ties as f64 - y_ties as f64 + joint_ties as f64 - 2.0 * swaps as f64;
    let tau = numerator / ((x_untied as f64) * (y_untied as f64)).sqrt();
    Ok(tau.clamp(-1.0, 1.0))
}

/// Number of tied pairs over runs of equal adjacent items
fn tied_pairs<T>(sorted: &[T], same: impl Fn(&T, &T) -> bool) -> u64 {
    let mut ties = 0u64;
    let mut run = 1u64;
    for window in sorted.windows(2) {
        if same(&window[0], &window[1]) {
            run += 1;
        } else {
            ties += run * (run - 1) / 2;
            run = 1;
        }
    }
    ties + run * (run - 1) / 2
}

/// Sort `values` ascending and return the number of strictly inverted pairs
fn count_inversions(values: &mut [f64]) -> u64 {
    let len = values.len();
    if len < 2 {
        return 0;
    }
    let mid = len / 2;
    let mut inversions = {
        let (left, right) = values.split_at_mut(mid);
        count_inversions(left) + count_inversions(right)
    };

    let mut merged = Vec::with_capacity(len);
    let (mut i, mut j) = (0, mid);
    while i < mid && j < len {
        if values[j] < values[i] {
            merged.push(values[j]);
            inversions += (mid - i) as u64;
            j += 1;
        } else {
            merged.push(values[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&values[i..mid]);
    merged.extend_from_slice(&values[j..]);
    values.copy_from_slice(&merged);
    inversions
}
