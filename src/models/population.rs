//! Population denominators, region groups and code-to-name tables

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::types::{RegionId, SpatialUnit};

/// Length of the county prefix used to assign regions to groups
pub const GROUP_PREFIX_LEN: usize = 2;

/// Total insured population per (region, year)
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    totals: HashMap<(RegionId, i32), u64>,
}

impl PopulationTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add population to (region, year); repeated rows are summed
    pub fn add(&mut self, region: RegionId, year: i32, population: u64) {
        *self.totals.entry((region, year)).or_insert(0) += population;
    }

    /// Total population of (region, year)
    #[must_use]
    pub fn get(&self, region: &RegionId, year: i32) -> Option<u64> {
        self.totals.get(&(region.clone(), year)).copied()
    }

    /// Number of (region, year) entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl FromIterator<(RegionId, i32, u64)> for PopulationTable {
    fn from_iter<T: IntoIterator<Item = (RegionId, i32, u64)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (region, year, population) in iter {
            table.add(region, year, population);
        }
        table
    }
}

/// Static mapping from county prefix to exposure zone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionGroups {
    groups: Vec<(String, Vec<String>)>,
}

impl RegionGroups {
    /// Create a mapping from (group id, member prefixes) pairs
    #[must_use]
    pub fn new(groups: Vec<(String, Vec<String>)>) -> Self {
        Self { groups }
    }

    /// The five exposure zones of the reference deployment
    #[must_use]
    pub fn reference() -> Self {
        let zone = |id: &str, prefixes: &[&str]| {
            (
                id.to_string(),
                prefixes.iter().map(|p| (*p).to_string()).collect(),
            )
        };
        Self::new(vec![
            zone("北北基桃竹苗", &["01", "31", "11", "32", "33", "35"]),
            zone("中彰投", &["03", "37", "38"]),
            zone("雲嘉南", &["39", "40", "05"]),
            zone("高屏", &["07", "43"]),
            zone("宜花東", &["34", "45", "46"]),
        ])
    }

    /// Group ids in declaration order
    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(id, _)| id.as_str())
    }

    /// Group of a spatial unit
    ///
    /// A unit that already is a group id maps to itself; otherwise the unit
    /// is read as a region code and matched by its county prefix.
    #[must_use]
    pub fn group_of(&self, unit: &SpatialUnit) -> Option<SpatialUnit> {
        if self.groups.iter().any(|(id, _)| id == unit.as_str()) {
            return Some(unit.clone());
        }
        let region = RegionId::parse(unit.as_str()).ok()?;
        self.group_of_region(&region)
    }

    /// Group of a region code, by county prefix
    #[must_use]
    pub fn group_of_region(&self, region: &RegionId) -> Option<SpatialUnit> {
        let prefix = region.prefix(GROUP_PREFIX_LEN);
        self.groups
            .iter()
            .find(|(_, prefixes)| prefixes.iter().any(|p| p == prefix))
            .map(|(id, _)| SpatialUnit::new(id))
    }
}

/// Region code to place-name table, used to join region series with
/// exposure tables keyed by name
#[derive(Debug, Clone, Default)]
pub struct RegionNames {
    names: HashMap<RegionId, SpatialUnit>,
}

impl RegionNames {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the name of a region; the name is whitespace-trimmed
    pub fn insert(&mut self, region: RegionId, name: impl AsRef<str>) {
        self.names.insert(region, SpatialUnit::new(name));
    }

    /// Name of a region
    #[must_use]
    pub fn name_of(&self, region: &RegionId) -> Option<&SpatialUnit> {
        self.names.get(region)
    }

    /// Number of named regions
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(RegionId, String)> for RegionNames {
    fn from_iter<T: IntoIterator<Item = (RegionId, String)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (region, name) in iter {
            table.insert(region, name);
        }
        table
    }
}

/// Cases and population of one spatial unit in one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCounts {
    /// Spatial unit (region code or group id)
    pub unit: SpatialUnit,
    /// Calendar year
    pub year: i32,
    /// Period index
    pub period: u32,
    /// Number of cases
    pub cases: u64,
    /// Insured population
    pub population: u64,
    /// Cases per 1000 population, rounded to 3 decimals
    pub rate: f64,
}
