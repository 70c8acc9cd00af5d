//! Data model for incidence analysis
//!
//! Plain data types shared by the algorithm modules and the table I/O
//! layer.

pub mod cluster;
pub mod lag;
pub mod population;
pub mod series;
pub mod types;

pub use cluster::{AssignmentRecord, ClusterAssignment, ClusterLabel, ClusterSummary, SummaryRecord};
pub use lag::{
    FittedLine, LagCandidate, LagDetail, MatchedPoint, Observation, PairedRow, YearCorrelation,
};
pub use population::{AreaCounts, PopulationTable, RegionGroups, RegionNames};
pub use series::{
    Attributes, CompletenessRecord, DenseSeries, PeriodSeries, PeriodValue, SeriesRecord, SparseRow,
};
pub use types::{PeriodKind, Provenance, RegionId, SeriesKey, SpatialUnit};
