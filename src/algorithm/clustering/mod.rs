//! Shape clustering of regions per year
//!
//! Regions with a complete series are clustered on their raw period
//! vectors; every other region of the year lands in the
//! [`ClusterLabel::Insufficient`] sentinel. Ranked labels are ordered by
//! descending mean annual incidence.

pub mod kmeans;
pub mod relabel;

use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;

use crate::algorithm::imputation::{ImputationOutcome, SeriesStore};
use crate::config::ClusteringConfig;
use crate::models::{ClusterAssignment, ClusterLabel, ClusterSummary, RegionId};

pub use kmeans::{KMeans, KMeansResult};
pub use relabel::{cluster_means, rank_by_mean};

/// Clustering of one year
#[derive(Debug, Clone, PartialEq)]
pub struct YearClustering {
    /// Calendar year
    pub year: i32,
    /// One assignment per region, ordered by region code
    pub assignments: Vec<ClusterAssignment>,
    /// One summary per non-empty label, ranked labels first
    pub summaries: Vec<ClusterSummary>,
}

/// Clusters regions by incidence shape
#[derive(Debug, Clone)]
pub struct RegionClusterer {
    config: ClusteringConfig,
}

impl RegionClusterer {
    /// Create a clusterer
    #[must_use]
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Cluster every year of a store, years in parallel
    ///
    /// Results are ordered by year.
    #[must_use]
    pub fn cluster_store(&self, store: &SeriesStore) -> Vec<YearClustering> {
        let years: Vec<i32> = store.years().into_iter().collect();
        let mut results: Vec<YearClustering> = years
            .par_iter()
            .map(|&year| {
                let outcomes: Vec<&ImputationOutcome> = store.year(year).collect();
                self.cluster_year(year, &outcomes)
            })
            .collect();
        results.sort_by_key(|r| r.year);
        results
    }

    /// Cluster the regions of one year
    #[must_use]
    pub fn cluster_year(&self, year: i32, outcomes: &[&ImputationOutcome]) -> YearClustering {
        let mut complete: Vec<(RegionId, Vec<f64>, f64)> = Vec::new();
        let mut incomplete: Vec<(RegionId, Option<f64>)> = Vec::new();

        for outcome in outcomes {
            match outcome {
                ImputationOutcome::Complete(series) => {
                    complete.push((series.key.region.clone(), series.vector(), series.mean()));
                }
                ImputationOutcome::Imputed(series) if self.config.include_imputed => {
                    complete.push((series.key.region.clone(), series.vector(), series.mean()));
                }
                ImputationOutcome::Imputed(series) => {
                    incomplete.push((series.key.region.clone(), Some(series.mean())));
                }
                ImputationOutcome::Unqualified(dense) => {
                    incomplete.push((dense.key().region.clone(), dense.observed_mean()));
                }
            }
        }
        complete.sort_by(|a, b| a.0.cmp(&b.0));
        incomplete.sort_by(|a, b| a.0.cmp(&b.0));

        let mut assignments = Vec::with_capacity(complete.len() + incomplete.len());
        let mut summaries = Vec::new();

        if complete.is_empty() {
            warn!("Year {year}: no region has a complete series, all regions are insufficient");
        } else {
            let points: Vec<Vec<f64>> = complete.iter().map(|(_, v, _)| v.clone()).collect();
            let member_means: Vec<f64> = complete.iter().map(|(_, _, m)| *m).collect();

            let fit = KMeans::new(self.config.k, self.config.seed)
                .with_max_iterations(self.config.max_iterations)
                .with_tolerance(self.config.tolerance)
                .fit(&points);
            info!(
                "Year {year}: {} complete regions in {} clusters after {} iterations",
                complete.len(),
                fit.k(),
                fit.iterations
            );

            let means = cluster_means(&fit.assignments, &member_means, fit.k());
            let labels = rank_by_mean(&means);

            let mut members: BTreeMap<ClusterLabel, (Vec<RegionId>, f64)> = BTreeMap::new();
            for ((region, _, _), raw) in complete.iter().zip(&fit.assignments) {
                let Some(label) = labels[*raw] else { continue };
                assignments.push(ClusterAssignment {
                    region: region.clone(),
                    year,
                    label,
                });
                let mean = means[*raw].unwrap_or(f64::NAN);
                members.entry(label).or_insert_with(|| (Vec::new(), mean)).0.push(region.clone());
            }

            summaries.extend(members.into_iter().map(|(label, (members, mean))| ClusterSummary {
                label,
                year,
                members,
                mean_annual_incidence: mean,
            }));
        }

        if !incomplete.is_empty() {
            if !complete.is_empty() {
                warn!(
                    "Year {year}: {} regions without a complete series assigned to the insufficient cluster",
                    incomplete.len()
                );
            }
            let observed: Vec<f64> = incomplete.iter().filter_map(|(_, m)| *m).collect();
            let mean = if observed.is_empty() {
                f64::NAN
            } else {
                observed.iter().sum::<f64>() / observed.len() as f64
            };

            assignments.extend(incomplete.iter().map(|(region, _)| ClusterAssignment {
                region: region.clone(),
                year,
                label: ClusterLabel::Insufficient,
            }));
            summaries.push(ClusterSummary {
                label: ClusterLabel::Insufficient,
                year,
                members: incomplete.into_iter().map(|(region, _)| region).collect(),
                mean_annual_incidence: mean,
            });
        }

        assignments.sort_by(|a, b| a.region.cmp(&b.region));
        YearClustering {
            year,
            assignments,
            summaries,
        }
    }
}

impl Default for RegionClusterer {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}
