use incidence_lag::algorithm::clustering::{KMeans, RegionClusterer};
use incidence_lag::algorithm::imputation::{ImputationOutcome, Imputer, SeriesStore};
use incidence_lag::models::{ClusterLabel, DenseSeries, PeriodKind, SeriesKey};
use incidence_lag::utils::test::region;
use incidence_lag::ClusteringConfig;

/// A weekly series at `level` with a mild three-week ripple, observed for
/// the first `observed` weeks
fn outcome(code: &str, year: i32, level: u64, observed: usize) -> ImputationOutcome {
    let key = SeriesKey::new(region(code), year);
    let counts: Vec<Option<u64>> = (0..53)
        .map(|w| (w < observed).then_some(level + (w as u64 % 3)))
        .collect();
    Imputer::default().impute(DenseSeries::from_counts(key, PeriodKind::Weekly, &counts))
}

fn store() -> SeriesStore {
    let levels = [3, 5, 40, 44, 120, 130, 300, 310, 900, 950, 12, 70];
    let mut outcomes: Vec<ImputationOutcome> = levels
        .iter()
        .enumerate()
        .map(|(i, level)| outcome(&format!("{:04}", 101 + i), 2017, *level, 53))
        .collect();
    outcomes.push(outcome("0201", 2017, 20, 10));
    outcomes.push(outcome("0202", 2017, 20, 35));
    outcomes.push(outcome("0101", 2018, 7, 53));
    outcomes.into_iter().collect()
}

/// Ranked clusters are ordered by descending mean annual incidence
#[test]
fn test_ranked_means_are_descending() {
    let results = RegionClusterer::default().cluster_store(&store());
    assert_eq!(results.len(), 2);

    for year in &results {
        let ranked: Vec<_> = year
            .summaries
            .iter()
            .filter(|s| !s.label.is_insufficient())
            .collect();
        for pair in ranked.windows(2) {
            assert!(pair[0].label < pair[1].label);
            assert!(pair[0].mean_annual_incidence >= pair[1].mean_annual_incidence);
        }
    }

    let y2017 = &results[0];
    assert_eq!(y2017.year, 2017);
    assert_eq!(
        y2017.summaries.iter().filter(|s| !s.label.is_insufficient()).count(),
        5
    );
    let top = y2017
        .assignments
        .iter()
        .find(|a| a.region.as_str() == "0110")
        .unwrap();
    assert_eq!(top.label, ClusterLabel::Ranked(0));
}

/// Sparse and imputed regions go to the sentinel cluster by default
#[test]
fn test_incomplete_regions_are_insufficient() {
    let results = RegionClusterer::default().cluster_store(&store());
    let y2017 = &results[0];

    for code in ["0201", "0202"] {
        let assignment = y2017
            .assignments
            .iter()
            .find(|a| a.region.as_str() == code)
            .unwrap();
        assert_eq!(assignment.label, ClusterLabel::Insufficient);
    }
    let sentinel = y2017.summaries.last().unwrap();
    assert!(sentinel.label.is_insufficient());
    assert_eq!(sentinel.member_count(), 2);
    assert_eq!(y2017.assignments.len(), 14);
}

/// A year with a single complete region yields one ranked cluster
#[test]
fn test_cluster_count_is_capped_by_regions() {
    let results = RegionClusterer::default().cluster_store(&store());
    let y2018 = &results[1];
    assert_eq!(y2018.summaries.len(), 1);
    assert_eq!(y2018.assignments[0].label, ClusterLabel::Ranked(0));
}

/// Two independent runs give the same labels
#[test]
fn test_clustering_is_deterministic() {
    let first = RegionClusterer::default().cluster_store(&store());
    let second = RegionClusterer::default().cluster_store(&store());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.assignments, b.assignments);
    }

    let points: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i % 7), f64::from(i)]).collect();
    let config = ClusteringConfig::default();
    let run = || {
        KMeans::new(config.k, config.seed)
            .with_max_iterations(config.max_iterations)
            .fit(&points)
    };
    assert_eq!(run().assignments, run().assignments);
}
