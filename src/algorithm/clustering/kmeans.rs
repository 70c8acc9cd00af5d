//! Seeded k-means over equal-length vectors
//!
//! k-means++ seeding from a `StdRng` with a fixed seed followed by Lloyd
//! iterations. Identical points, seed and k give identical raw labels.

use rand::prelude::*;

/// Raw clustering of a point set
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Raw cluster index of every point, in input order
    pub assignments: Vec<usize>,
    /// Final centroids
    pub centroids: Vec<Vec<f64>>,
    /// Lloyd iterations performed
    pub iterations: usize,
}

impl KMeansResult {
    /// Number of clusters actually fitted
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }
}

/// Parameters of a k-means run
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    k: usize,
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    /// Create a k-means configuration
    #[must_use]
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }

    /// Set the iteration limit
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the convergence tolerance, relative to the mean per-dimension
    /// variance of the data
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cluster `points`
    ///
    /// Fewer clusters than `k` are fitted when there are fewer distinct
    /// points than `k`.
    #[must_use]
    pub fn fit(&self, points: &[Vec<f64>]) -> KMeansResult {
        let k = self.k.min(distinct_count(points));
        if k == 0 {
            return KMeansResult {
                assignments: Vec::new(),
                centroids: Vec::new(),
                iterations: 0,
            };
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = init_plus_plus(points, k, &mut rng);
        let threshold = self.tolerance * mean_variance(points);

        let mut assignments = assign(points, &centroids);
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            let updated = update_centroids(points, &assignments, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;
            assignments = assign(points, &centroids);
            if shift <= threshold {
                break;
            }
        }

        KMeansResult {
            assignments,
            centroids,
            iterations,
        }
    }
}

/// Squared Euclidean distance
#[must_use]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distinct_count(points: &[Vec<f64>]) -> usize {
    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.dedup();
    sorted.len()
}

fn mean_variance(points: &[Vec<f64>]) -> f64 {
    let Some(dims) = points.first().map(Vec::len) else {
        return 0.0;
    };
    if dims == 0 {
        return 0.0;
    }
    let n = points.len() as f64;
    let total: f64 = (0..dims)
        .map(|d| {
            let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
            points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();
    total / dims as f64
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, current| {
            if current.1 < best.1 { current } else { best }
        })
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points.iter().map(|p| nearest(p, centroids).0).collect()
}

fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            break;
        }

        let target = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (idx, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            chosen = Some(idx);
            if cumulative > target {
                break;
            }
        }

        match chosen {
            Some(idx) => centroids.push(points[idx].clone()),
            None => break,
        }
    }

    centroids
}

fn update_centroids(
    points: &[Vec<f64>],
    assignments: &[usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let dims = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dims]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(point) {
            *sum += value;
        }
    }

    let mut centroids: Vec<Vec<f64>> = sums
        .into_iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), old)| {
            if count == 0 {
                old.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect();

    // Empty clusters move to the point farthest from its own centroid
    let mut taken: Vec<usize> = Vec::new();
    for cluster in (0..centroids.len()).filter(|&c| counts[c] == 0) {
        let farthest = points
            .iter()
            .enumerate()
            .filter(|(idx, _)| !taken.contains(idx))
            .map(|(idx, p)| (idx, squared_distance(p, &centroids[assignments[idx]])))
            .fold(None, |best: Option<(usize, f64)>, current| match best {
                Some(b) if b.1 >= current.1 => Some(b),
                _ => Some(current),
            });
        if let Some((idx, _)) = farthest {
            taken.push(idx);
            centroids[cluster] = points[idx].clone();
        }
    }

    centroids
}
