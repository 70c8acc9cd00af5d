//! Canonical relabelling of raw clusters by burden

use std::cmp::Ordering;

use crate::models::ClusterLabel;

/// Mean of the members' values for every raw cluster; `None` for clusters
/// without members
#[must_use]
pub fn cluster_means(assignments: &[usize], member_means: &[f64], k: usize) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (&cluster, &mean) in assignments.iter().zip(member_means) {
        sums[cluster] += mean;
        counts[cluster] += 1;
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
        .collect()
}

/// Map raw cluster indices to ranked labels: the highest mean becomes
/// `Ranked(0)`
///
/// Ties keep the lower raw index first. Clusters without members get no
/// label.
#[must_use]
pub fn rank_by_mean(means: &[Option<f64>]) -> Vec<Option<ClusterLabel>> {
    let mut order: Vec<(usize, f64)> = means
        .iter()
        .enumerate()
        .filter_map(|(idx, mean)| mean.map(|m| (idx, m)))
        .collect();
    order.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    let mut labels = vec![None; means.len()];
    for (rank, (idx, _)) in order.into_iter().enumerate() {
        labels[idx] = Some(ClusterLabel::Ranked(rank as u32));
    }
    labels
}
