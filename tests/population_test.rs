use incidence_lag::algorithm::calendar::normalize_all;
use incidence_lag::algorithm::imputation::Imputer;
use incidence_lag::algorithm::population::{
    FilterCriteria, RegionFilter, aggregate_by_group, label_by_name, outcome_series,
    pair_with_exposure, per_thousand, region_rates, series_rates,
};
use incidence_lag::models::{
    AreaCounts, Observation, PeriodKind, PopulationTable, RegionGroups, RegionNames, SpatialUnit,
};
use incidence_lag::utils::test::{full_year, region, rows_for};
use incidence_lag::DuplicatePolicy;

fn population() -> PopulationTable {
    vec![
        (region("0101"), 2017, 1000),
        (region("0102"), 2017, 3000),
        (region("0301"), 2017, 2000),
    ]
    .into_iter()
    .collect()
}

/// Outlying island codes are removed, every other region is kept
#[test]
fn test_default_region_filter() {
    let filter = RegionFilter::default();
    let mut rows = rows_for("4401", 2017, &[(1, 1), (2, 1)]);
    rows.extend(rows_for("4611", 2017, &[(1, 1)]));
    rows.extend(rows_for("4612", 2017, &[(1, 1)]));
    rows.extend(rows_for("0101", 2017, &[(1, 1)]));

    assert_eq!(filter.retain(&mut rows), 3);
    let kept: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(kept, vec!["4612", "0101"]);

    let named = AreaCounts {
        unit: SpatialUnit::new("Hualien"),
        year: 2017,
        period: 1,
        cases: 1,
        population: 10,
        rate: 100.0,
    };
    assert!(filter.meets_criteria(&named));
    assert_eq!(RegionFilter::none().retain(&mut rows), 0);
}

/// Rates are per 1000 population and rows without a denominator are dropped
#[test]
fn test_region_rates() {
    let mut rows = rows_for("0101", 2017, &[(1, 3), (2, 0)]);
    rows.extend(rows_for("0201", 2017, &[(1, 5)]));

    let rates = region_rates(&rows, &population());
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].rate, 3.0);
    assert_eq!(rates[1].rate, 0.0);
    assert_eq!(per_thousand(1, 7), Some(142.857));
}

/// Completed series join the population table period by period
#[test]
fn test_series_rates() {
    let rows = full_year("0102", 2017, PeriodKind::Monthly, |p| u64::from(p));
    let dense = normalize_all(&rows, PeriodKind::Monthly, DuplicatePolicy::LastWins)
        .series
        .remove(0);
    let imputer = Imputer::new(incidence_lag::ImputationConfig::for_kind(PeriodKind::Monthly));
    let series = imputer.impute(dense).series().cloned().unwrap();

    let rates = series_rates(&[series], &population());
    assert_eq!(rates.len(), 12);
    assert_eq!(rates[11].cases, 12);
    assert_eq!(rates[11].rate, 4.0);
}

/// Group totals sum cases and population before the rate is recomputed
#[test]
fn test_group_aggregation() {
    let mut rows = rows_for("0101", 2017, &[(1, 2)]);
    rows.extend(rows_for("0102", 2017, &[(1, 6)]));
    rows.extend(rows_for("0301", 2017, &[(1, 1)]));
    let rates = region_rates(&rows, &population());

    let groups = RegionGroups::reference();
    let grouped = aggregate_by_group(&rates, &groups);
    assert_eq!(grouped.len(), 2);

    let north = grouped
        .iter()
        .find(|g| g.unit.as_str() == "北北基桃竹苗")
        .unwrap();
    assert_eq!(north.cases, 8);
    assert_eq!(north.population, 4000);
    assert_eq!(north.rate, 2.0);

    // already-grouped rows map to themselves
    assert_eq!(aggregate_by_group(&grouped, &groups), grouped);
}

/// Region codes are relabelled with place names; unknown codes are dropped
#[test]
fn test_label_by_name() {
    let rows = rows_for("0101", 2017, &[(1, 2)])
        .into_iter()
        .chain(rows_for("0301", 2017, &[(1, 4)]))
        .collect::<Vec<_>>();
    let rates = region_rates(&rows, &population());

    let names: RegionNames = vec![(region("0101"), " Songshan ".to_string())]
        .into_iter()
        .collect();
    let labelled = label_by_name(&rates, &names);
    assert_eq!(labelled.len(), 1);
    assert_eq!(labelled[0].unit.as_str(), "Songshan");
    assert_eq!(labelled[0].rate, 2.0);
}

/// Outcome rows are left-joined with exposure; a missing exposure stays null
#[test]
fn test_pair_with_exposure() {
    let rows = rows_for("0101", 2017, &[(1, 2), (2, 4)]);
    let rates = region_rates(&rows, &population());
    let exposure = vec![Observation::new("0101", 2017, 1, 35.5)];

    let paired = pair_with_exposure(&rates, &exposure);
    assert_eq!(paired.len(), 2);
    assert_eq!(paired[0].exposure, Some(35.5));
    assert_eq!(paired[0].outcome, Some(2.0));
    assert_eq!(paired[1].exposure, None);

    let outcome = outcome_series(&rates);
    assert_eq!(outcome[1].value, 4.0);
    assert_eq!(outcome[1].unit.as_str(), "0101");
}
