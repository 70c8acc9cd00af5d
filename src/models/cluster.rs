//! Cluster labels, assignments and per-cluster summaries

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::models::types::RegionId;

/// Final cluster label of a region
///
/// Ranked labels are ordered by burden (0 = highest mean annual incidence).
/// `Insufficient` collects regions kept out of the shape model and is never
/// ranked; it sorts after every ranked label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Burden rank among the fitted clusters
    Ranked(u32),
    /// Sentinel for regions without a complete series
    Insufficient,
}

impl ClusterLabel {
    /// Label used in output tables
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Whether this is the sentinel label
    #[must_use]
    pub const fn is_insufficient(self) -> bool {
        matches!(self, Self::Insufficient)
    }

    /// The burden rank for ranked labels
    #[must_use]
    pub const fn rank(self) -> Option<u32> {
        match self {
            Self::Ranked(rank) => Some(rank),
            Self::Insufficient => None,
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranked(rank) => write!(f, "{rank}"),
            Self::Insufficient => f.write_str("insufficient"),
        }
    }
}

/// Cluster membership of one region in one year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    /// Region code
    pub region: RegionId,
    /// Calendar year
    pub year: i32,
    /// Final (relabelled) cluster
    pub label: ClusterLabel,
}

/// Summary of one cluster in one year
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Final cluster label
    pub label: ClusterLabel,
    /// Calendar year
    pub year: i32,
    /// Members ordered by region code
    pub members: Vec<RegionId>,
    /// Mean over members of each member's period-average incidence
    pub mean_annual_incidence: f64,
}

impl ClusterSummary {
    /// Number of member regions
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Output row of the per-region assignment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Region code
    pub region_id: String,
    /// Calendar year
    pub year: i32,
    /// Cluster label ("0".."k-1" or "insufficient")
    pub cluster: String,
}

impl From<&ClusterAssignment> for AssignmentRecord {
    fn from(value: &ClusterAssignment) -> Self {
        Self {
            region_id: value.region.to_string(),
            year: value.year,
            cluster: value.label.label(),
        }
    }
}

/// Output row of the per-cluster summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Cluster label ("0".."k-1" or "insufficient")
    pub cluster: String,
    /// Calendar year
    pub year: i32,
    /// Number of member regions
    pub member_count: u32,
    /// Comma-separated member region codes
    pub member_list: String,
    /// Mean annual incidence of the cluster
    pub mean_annual_incidence: f64,
}

impl From<&ClusterSummary> for SummaryRecord {
    fn from(value: &ClusterSummary) -> Self {
        Self {
            cluster: value.label.label(),
            year: value.year,
            member_count: value.member_count() as u32,
            member_list: value.members.iter().map(RegionId::as_str).join(","),
            mean_annual_incidence: value.mean_annual_incidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_sorts_after_ranked_labels() {
        let mut labels = vec![
            ClusterLabel::Insufficient,
            ClusterLabel::Ranked(3),
            ClusterLabel::Ranked(0),
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                ClusterLabel::Ranked(0),
                ClusterLabel::Ranked(3),
                ClusterLabel::Insufficient
            ]
        );
        assert_eq!(ClusterLabel::Insufficient.rank(), None);
    }

    #[test]
    fn summary_record_joins_members() {
        let summary = ClusterSummary {
            label: ClusterLabel::Ranked(1),
            year: 2017,
            members: vec![
                RegionId::parse("0101").unwrap(),
                RegionId::parse("0102").unwrap(),
            ],
            mean_annual_incidence: 12.5,
        };
        let record = SummaryRecord::from(&summary);
        assert_eq!(record.cluster, "1");
        assert_eq!(record.member_count, 2);
        assert_eq!(record.member_list, "0101,0102");
    }
}
