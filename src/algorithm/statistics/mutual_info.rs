//! Mutual information estimation using k-nearest neighbors
//!
//! Kraskov-Stögbauer-Grassberger (KSG) estimator, algorithm 1, on samples
//! scaled to unit standard deviation:
//!
//! ```text
//! I(X;Y) = ψ(N) + ψ(k) - <ψ(nₓ + 1)> - <ψ(nᵧ + 1)>
//! ```
//!
//! where εᵢ is the max-norm distance from point i to its k-th neighbour in
//! the joint space and nₓ, nᵧ count the other points strictly closer than
//! εᵢ in each marginal. The estimate is in nats and floored at zero.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{DegenerateInput, StatResult, check_sample, is_constant, mean};

/// KSG mutual-information estimator
#[derive(Debug, Clone)]
pub struct MutualInfoEstimator {
    /// Number of nearest neighbors
    k: usize,
}

impl MutualInfoEstimator {
    /// Create an estimator using `k` neighbours (at least 1)
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    /// Neighbour count in use
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Estimate I(X;Y) in nats
    pub fn estimate(&self, x: &[f64], y: &[f64]) -> StatResult {
        check_sample(x, y, self.k + 1)?;
        if is_constant(x) || is_constant(y) {
            return Err(DegenerateInput::ZeroVariance);
        }

        let x = scale(x);
        let y = scale(y);
        let n = x.len();

        // Points ordered by x bound the neighbour search
        let mut by_x: Vec<usize> = (0..n).collect();
        by_x.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
        let mut position = vec![0; n];
        for (pos, &idx) in by_x.iter().enumerate() {
            position[idx] = pos;
        }

        let mut sorted_x = x.clone();
        sorted_x.sort_by(f64::total_cmp);
        let mut sorted_y = y.clone();
        sorted_y.sort_by(f64::total_cmp);

        let mut sum_psi = 0.0;
        for i in 0..n {
            let eps = self.kth_neighbor_distance(&x, &y, &by_x, position[i]);
            let nx = count_closer(&sorted_x, x[i], eps);
            let ny = count_closer(&sorted_y, y[i], eps);
            sum_psi += digamma(nx as f64 + 1.0) + digamma(ny as f64 + 1.0);
        }

        let mi = digamma(n as f64) + digamma(self.k as f64) - sum_psi / n as f64;
        Ok(mi.max(0.0))
    }

    /// Max-norm distance from the point at `pos` (in x order) to its k-th
    /// nearest neighbour
    fn kth_neighbor_distance(&self, x: &[f64], y: &[f64], by_x: &[usize], pos: usize) -> f64 {
        let i = by_x[pos];
        let mut heap: BinaryHeap<OrderedFloat> = BinaryHeap::with_capacity(self.k + 1);

        let mut consider = |j: usize| -> bool {
            let dx = (x[i] - x[j]).abs();
            if heap.len() == self.k && heap.peek().is_some_and(|m| dx > m.0) {
                // Every further point in this direction is farther in x
                return false;
            }
            let dist = dx.max((y[i] - y[j]).abs());
            if heap.len() < self.k {
                heap.push(OrderedFloat(dist));
            } else if heap.peek().is_some_and(|m| dist < m.0) {
                heap.pop();
                heap.push(OrderedFloat(dist));
            }
            true
        };

        for &j in by_x[pos + 1..].iter() {
            if !consider(j) {
                break;
            }
        }
        for &j in by_x[..pos].iter().rev() {
            if !consider(j) {
                break;
            }
        }

        heap.peek().map_or(f64::INFINITY, |m| m.0)
    }
}

impl Default for MutualInfoEstimator {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Divide by the population standard deviation
fn scale(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    let sd = var.sqrt();
    values.iter().map(|v| v / sd).collect()
}

/// Number of values other than `target` itself within distance `eps`
///
/// Distances must be strictly below `eps`; for `eps == 0` only exact
/// duplicates count.
fn count_closer(sorted: &[f64], target: f64, eps: f64) -> usize {
    let (lo, hi) = if eps > 0.0 {
        (
            sorted.partition_point(|&v| v <= target - eps),
            sorted.partition_point(|&v| v < target + eps),
        )
    } else {
        (
            sorted.partition_point(|&v| v < target),
            sorted.partition_point(|&v| v <= target),
        )
    };
    hi.saturating_sub(lo).saturating_sub(1)
}

/// Digamma function ψ(x) = d/dx ln Γ(x)
///
/// Recurrence up to x ≥ 6, then the asymptotic series.
#[must_use]
pub fn digamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let mut result = 0.0;
    let mut x = x;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }

    result += x.ln() - 0.5 / x;
    let x2 = x * x;
    result -= 1.0 / (12.0 * x2);
    result += 1.0 / (120.0 * x2 * x2);
    result -= 1.0 / (252.0 * x2 * x2 * x2);
    result
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedFloat(f64);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
