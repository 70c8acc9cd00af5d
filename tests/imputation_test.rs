use incidence_lag::algorithm::calendar::normalize_all;
use incidence_lag::algorithm::imputation::{ImputationOutcome, Imputer, SeriesStore};
use incidence_lag::models::{DenseSeries, PeriodKind, Provenance, SeriesKey};
use incidence_lag::utils::test::{partial_year, region, rows_for};
use incidence_lag::{DuplicatePolicy, ImputationConfig};

fn dense(rows: &[incidence_lag::SparseRow]) -> DenseSeries {
    let mut output = normalize_all(rows, PeriodKind::Weekly, DuplicatePolicy::LastWins);
    output.series.remove(0)
}

/// Weeks 1-43 observed: weeks 44-53 carry week 43 forward
#[test]
fn test_trailing_gap_is_forward_filled() {
    let rows = partial_year("1001", 2017, 1..=43, u64::from);
    let outcome = Imputer::default().impute(dense(&rows));

    let ImputationOutcome::Imputed(series) = outcome else {
        panic!("expected an imputed series");
    };
    assert_eq!(series.values.len(), 53);
    for value in &series.values[43..] {
        assert_eq!(value.case_count, 43);
        assert_eq!(value.provenance, Provenance::ForwardFilled);
    }
    assert!(series.values[..43].iter().all(|v| v.provenance == Provenance::Observed));
}

/// Ten observed weeks are too few to impute
#[test]
fn test_sparse_series_is_unqualified() {
    let rows = partial_year("1002", 2017, 1..=10, |_| 3);
    let outcome = Imputer::default().impute(dense(&rows));
    assert!(outcome.is_unqualified());
    assert!(outcome.series().is_none());
}

/// The threshold itself is imputable; one below is not
#[test]
fn test_threshold_boundary() {
    let imputer = Imputer::new(ImputationConfig::for_kind(PeriodKind::Weekly));
    assert_eq!(imputer.config().low_threshold, 27);

    let at = partial_year("1003", 2017, 1..=27, |_| 1);
    assert!(!imputer.impute(dense(&at)).is_unqualified());

    let below = partial_year("1003", 2017, 1..=26, |_| 1);
    assert!(imputer.impute(dense(&below)).is_unqualified());
}

/// Interior gaps are interpolated then rounded, leading gaps carried back
#[test]
fn test_interior_and_leading_gaps() {
    let mut observed: Vec<(u32, u64)> = (3..=53).filter(|p| *p != 10).map(|p| (p, 10)).collect();
    observed.retain(|&(p, _)| p != 9 && p != 11);
    observed.push((9, 1));
    observed.push((11, 4));
    let rows = rows_for("1004", 2017, &observed);

    let ImputationOutcome::Imputed(series) = Imputer::default().impute(dense(&rows)) else {
        panic!("expected an imputed series");
    };
    let v = &series.values;
    assert_eq!(v[0].case_count, 10);
    assert_eq!(v[0].provenance, Provenance::BackwardFilled);
    assert_eq!(v[1].provenance, Provenance::BackwardFilled);
    // midpoint of 1 and 4 is 2.5, rounded half to even
    assert_eq!(v[9].case_count, 2);
    assert_eq!(v[9].provenance, Provenance::Interpolated);

    for value in v {
        assert!(matches!(
            value.provenance,
            Provenance::Observed
                | Provenance::Interpolated
                | Provenance::ForwardFilled
                | Provenance::BackwardFilled
        ));
    }
}

/// Attributes are carried from source rows and null on filled periods
#[test]
fn test_attributes_follow_source_rows() {
    let rows: Vec<_> = partial_year("1005", 2017, 1..=30, |_| 2)
        .into_iter()
        .map(|r| r.with_attribute("disease", "dengue"))
        .collect();
    let ImputationOutcome::Imputed(series) = Imputer::default().impute(dense(&rows)) else {
        panic!("expected an imputed series");
    };
    assert_eq!(
        series.values[0].attributes.get("disease"),
        Some(&Some("dengue".to_string()))
    );
    assert_eq!(series.values[52].attributes.get("disease"), Some(&None));
}

/// A later outcome for the same key replaces the earlier one
#[test]
fn test_store_keeps_one_series_per_key() {
    let key = SeriesKey::new(region("1006"), 2017);
    let sparse = DenseSeries::from_counts(key.clone(), PeriodKind::Monthly, &[Some(1); 3]);
    let full = DenseSeries::from_counts(key.clone(), PeriodKind::Monthly, &[Some(1); 12]);

    let imputer = Imputer::new(ImputationConfig::for_kind(PeriodKind::Monthly));
    let mut store = SeriesStore::new();
    store.insert(imputer.impute(sparse));
    let replaced = store.insert(imputer.impute(full));

    assert!(replaced.is_some_and(|old| old.is_unqualified()));
    assert_eq!(store.len(), 1);
    assert!(store.get(&key).is_some_and(ImputationOutcome::is_complete));
    assert_eq!(store.records(false).len(), 12);
}
