//! Per-capita rates and region-group aggregation
//!
//! Rates are cases per 1000 insured persons rounded to three decimals.
//! Rows that cannot be joined to a denominator or a group are reported and
//! dropped, never carried with a null key.

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::models::{
    AreaCounts, Observation, PairedRow, PeriodSeries, PopulationTable, RegionGroups, RegionId,
    RegionNames, SparseRow, SpatialUnit,
};

/// Cases per 1000 population, rounded half-to-even to three decimals
#[must_use]
pub fn per_thousand(cases: u64, population: u64) -> Option<f64> {
    if population == 0 {
        return None;
    }
    let rate = cases as f64 / population as f64 * 1000.0;
    Some((rate * 1000.0).round_ties_even() / 1000.0)
}

/// Join source rows with the population table
pub fn region_rates(rows: &[SparseRow], population: &PopulationTable) -> Vec<AreaCounts> {
    join_population(
        rows.iter()
            .map(|r| (&r.region, r.year, r.period, r.case_count)),
        population,
    )
}

/// Join completed series with the population table
pub fn series_rates(series: &[PeriodSeries], population: &PopulationTable) -> Vec<AreaCounts> {
    join_population(
        series.iter().flat_map(|s| {
            s.values
                .iter()
                .map(move |v| (&s.key.region, s.key.year, v.period, v.case_count))
        }),
        population,
    )
}

fn join_population<'a, I>(entries: I, population: &PopulationTable) -> Vec<AreaCounts>
where
    I: IntoIterator<Item = (&'a RegionId, i32, u32, u64)>,
{
    let mut unmatched: BTreeSet<(RegionId, i32)> = BTreeSet::new();
    let mut counts = Vec::new();

    for (region, year, period, cases) in entries {
        let total = population.get(region, year).filter(|&p| p > 0);
        match total.and_then(|p| per_thousand(cases, p).map(|rate| (p, rate))) {
            Some((total, rate)) => counts.push(AreaCounts {
                unit: SpatialUnit::from(region),
                year,
                period,
                cases,
                population: total,
                rate,
            }),
            None => {
                unmatched.insert((region.clone(), year));
            }
        }
    }

    if !unmatched.is_empty() {
        let sample: Vec<String> = unmatched
            .iter()
            .take(10)
            .map(|(r, y)| format!("{r}/{y}"))
            .collect();
        warn!(
            "No population for {} region-years, their rows are excluded: {}",
            unmatched.len(),
            sample.join(", ")
        );
    }
    counts
}

/// Sum cases and population over the members of each region group and
/// recompute the rate per (group, year, period)
///
/// Units that already are group ids map to themselves, so aggregating an
/// aggregated table returns it unchanged.
pub fn aggregate_by_group(counts: &[AreaCounts], groups: &RegionGroups) -> Vec<AreaCounts> {
    let mut totals: BTreeMap<(SpatialUnit, i32, u32), (u64, u64)> = BTreeMap::new();
    let mut unmapped: BTreeSet<SpatialUnit> = BTreeSet::new();

    for row in counts {
        let Some(group) = groups.group_of(&row.unit) else {
            unmapped.insert(row.unit.clone());
            continue;
        };
        let entry = totals.entry((group, row.year, row.period)).or_insert((0, 0));
        entry.0 += row.cases;
        entry.1 += row.population;
    }

    if !unmapped.is_empty() {
        warn!(
            "{} spatial units have no region group and are excluded: {}",
            unmapped.len(),
            unmapped.iter().map(SpatialUnit::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    totals
        .into_iter()
        .filter_map(|((unit, year, period), (cases, population))| {
            per_thousand(cases, population).map(|rate| AreaCounts {
                unit,
                year,
                period,
                cases,
                population,
                rate,
            })
        })
        .collect()
}

/// Relabel region-level rows with place names
///
/// Rows whose unit is not a known region code are excluded with a warning.
pub fn label_by_name(counts: &[AreaCounts], names: &RegionNames) -> Vec<AreaCounts> {
    let mut unmapped: BTreeSet<String> = BTreeSet::new();
    let labelled: Vec<AreaCounts> = counts
        .iter()
        .filter_map(|row| {
            let name = RegionId::parse(row.unit.as_str())
                .ok()
                .and_then(|region| names.name_of(&region).cloned());
            match name {
                Some(unit) => Some(AreaCounts {
                    unit,
                    ..row.clone()
                }),
                None => {
                    unmapped.insert(row.unit.to_string());
                    None
                }
            }
        })
        .collect();

    if !unmapped.is_empty() {
        warn!(
            "Region codes without a place name are excluded: {}",
            unmapped.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    labelled
}

/// Outcome rate series of aggregated rows
#[must_use]
pub fn outcome_series(counts: &[AreaCounts]) -> Vec<Observation> {
    counts
        .iter()
        .map(|c| Observation {
            unit: c.unit.clone(),
            year: c.year,
            period: c.period,
            value: c.rate,
        })
        .collect()
}

/// Left-join outcome rates with exposure values on (unit, year, period)
pub fn pair_with_exposure(counts: &[AreaCounts], exposure: &[Observation]) -> Vec<PairedRow> {
    let index: FxHashMap<(&SpatialUnit, i32, u32), f64> = exposure
        .iter()
        .map(|e| ((&e.unit, e.year, e.period), e.value))
        .collect();

    let paired: Vec<PairedRow> = counts
        .iter()
        .map(|c| PairedRow {
            unit: c.unit.clone(),
            year: c.year,
            period: c.period,
            outcome: Some(c.rate),
            exposure: index.get(&(&c.unit, c.year, c.period)).copied(),
        })
        .collect();

    let missing = paired.iter().filter(|p| p.exposure.is_none()).count();
    info!(
        "Paired {} outcome rows with exposure ({} without exposure value)",
        paired.len(),
        missing
    );
    paired
}
