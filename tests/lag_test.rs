use std::time::Duration;

use incidence_lag::algorithm::lag::{LagScanner, ScanInput, correlate_by_year, inspect_top, shift_key};
use incidence_lag::models::{Observation, PeriodKind};
use incidence_lag::utils::test::{lagged_paired_rows, lagged_series};
use incidence_lag::ScanConfig;

fn config(min_shift: i32, max_shift: i32) -> ScanConfig {
    ScanConfig {
        min_shift,
        max_shift,
        year_range: None,
        ..ScanConfig::weekly()
    }
}

/// Shifted exposure reproduces the outcome exactly at shift 1
#[test]
fn test_true_lag_is_ranked_first() {
    let (exposure, outcome) = lagged_series(4, 2017);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let report = LagScanner::new(config(0, 5)).scan(&input);

    let best = &report.candidates[0];
    assert_eq!(best.shift, 1);
    assert_eq!(best.matched, 12);
    assert!((best.spearman - 1.0).abs() < 1e-12);
    assert!((best.pearson - 1.0).abs() < 1e-12);
    assert!((best.kendall - 1.0).abs() < 1e-12);
    assert!((best.regression_slope - 1.0).abs() < 1e-9);
    assert!((best.r2_degree2 - 1.0).abs() < 1e-9);
    assert!(best.mutual_information > 0.0);

    for pair in report.candidates.windows(2) {
        assert!(pair[0].spearman >= pair[1].spearman);
    }
}

/// Shifts with too few matched pairs produce no candidate row
#[test]
fn test_small_samples_are_discarded() {
    let (exposure, outcome) = lagged_series(4, 2017);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let report = LagScanner::new(config(0, 5)).scan(&input);

    let kept: Vec<i32> = report.candidates.iter().map(|c| c.shift).collect();
    assert_eq!(kept.len(), 2);
    assert!(kept.contains(&0) && kept.contains(&1));

    let discarded: Vec<(i32, usize)> = report.discarded.iter().map(|d| (d.shift, d.matched)).collect();
    assert_eq!(discarded, vec![(2, 8), (3, 4), (4, 0), (5, 0)]);
    assert!(report.is_complete());
}

/// At shift 0 the join matches every key present in both series
#[test]
fn test_shift_zero_is_identity() {
    for period in 1..=53 {
        assert_eq!(shift_key(2018, period, 0, 53), (2018, period));
    }

    let (exposure, mut outcome) = lagged_series(4, 2017);
    outcome.retain(|o| o.period != 2);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let report = LagScanner::new(config(0, 0)).scan(&input);
    assert_eq!(report.candidate(0).map(|c| c.matched), Some(12));
}

/// Shifts carry across year boundaries with a fixed period length
#[test]
fn test_shift_crosses_year_boundary() {
    assert_eq!(shift_key(2016, 50, 5, 53), (2017, 2));
    assert_eq!(shift_key(2016, 53, 1, 53), (2017, 1));
    assert_eq!(shift_key(2016, 12, 1, 12), (2017, 1));
    assert_eq!(shift_key(2016, 1, 199, 53), (2019, 41));
}

/// Constant exposure gives undefined correlations but keeps the row
#[test]
fn test_constant_exposure_keeps_candidate() {
    let exposure: Vec<Observation> = (1..=12).map(|p| Observation::new("A", 2017, p, 5.0)).collect();
    let outcome: Vec<Observation> = (1..=12)
        .map(|p| Observation::new("A", 2017, p, f64::from(p)))
        .collect();
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let report = LagScanner::new(config(0, 0)).scan(&input);

    let candidate = report.candidate(0).unwrap();
    assert_eq!(candidate.matched, 12);
    assert!(candidate.spearman.is_nan());
    assert!(candidate.pearson.is_nan());
    assert!(candidate.kendall.is_nan());
}

/// Paired rows with a missing value are dropped before scanning
#[test]
fn test_paired_input() {
    let rows = lagged_paired_rows(4, 2017);
    let input = ScanInput::from_paired(PeriodKind::Weekly, &rows);
    assert_eq!(input.exposure.len(), 16);
    assert_eq!(input.outcome.len(), 16);
    assert_eq!(input.units().len(), 4);

    let report = LagScanner::new(config(1, 3)).scan(&input);
    assert_eq!(report.top(1)[0].shift, 1);
}

/// The configured year window applies before joining
#[test]
fn test_year_window() {
    let (exposure, outcome) = lagged_series(4, 2017);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let window = ScanConfig {
        year_range: Some((2018, 2019)),
        ..config(0, 1)
    };
    let report = LagScanner::new(window).scan(&input);
    assert!(report.candidates.is_empty());
    assert_eq!(report.discarded.len(), 2);
}

/// An expired deadline leaves every shift unevaluated
#[test]
fn test_expired_deadline() {
    let (exposure, outcome) = lagged_series(4, 2017);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let expired = ScanConfig {
        deadline: Some(Duration::ZERO),
        ..config(0, 3)
    };
    let report = LagScanner::new(expired).scan(&input);
    assert!(!report.is_complete());
    assert_eq!(report.not_evaluated, vec![0, 1, 2, 3]);
    assert!(report.candidates.is_empty());
}

/// Detail views carry the matched points and one fit per unit
#[test]
fn test_inspect_top_and_yearly() {
    let (exposure, outcome) = lagged_series(4, 2017);
    let input = ScanInput::new(PeriodKind::Weekly, exposure, outcome);
    let report = LagScanner::new(config(0, 3)).scan(&input);

    let details = inspect_top(&input, &report.candidates, 5);
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].rank, 1);
    assert_eq!(details[0].points.len(), 12);
    assert_eq!(details[0].unit_fits.len(), 4);
    let fit = details[0].overall_fit.unwrap();
    assert!((fit.slope - 1.0).abs() < 1e-9);

    let yearly = correlate_by_year(&input);
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].year, 2017);
    assert_eq!(yearly[0].samples, 16);
}
