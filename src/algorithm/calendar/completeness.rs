//! Completeness report: distinct observed periods per (source, region, year)

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CompletenessRecord, PeriodKind, SeriesKey, SparseRow};

/// Count the distinct valid periods of every (region, year) in `rows`
///
/// Records are ordered by (region, year).
#[must_use]
pub fn completeness_records(
    source: &str,
    rows: &[SparseRow],
    kind: PeriodKind,
) -> Vec<CompletenessRecord> {
    let mut periods: BTreeMap<SeriesKey, BTreeSet<u32>> = BTreeMap::new();
    for row in rows.iter().filter(|r| kind.validate(r.period).is_ok()) {
        periods.entry(row.key()).or_default().insert(row.period);
    }

    periods
        .into_iter()
        .map(|(key, seen)| CompletenessRecord {
            source: source.to_string(),
            region_id: key.region.to_string(),
            year: key.year,
            observed_period_count: seen.len() as u32,
        })
        .collect()
}

/// Records with fewer than `P` observed periods
#[must_use]
pub fn short_series(records: &[CompletenessRecord], kind: PeriodKind) -> Vec<CompletenessRecord> {
    records
        .iter()
        .filter(|r| r.observed_period_count < kind.periods())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionId;

    #[test]
    fn counts_distinct_periods() {
        let a = RegionId::parse("0101").unwrap();
        let b = RegionId::parse("0102").unwrap();
        let mut rows: Vec<SparseRow> = (1..=12).map(|m| SparseRow::new(a.clone(), 2017, m, 1)).collect();
        rows.push(SparseRow::new(b.clone(), 2017, 4, 1));
        rows.push(SparseRow::new(b.clone(), 2017, 4, 2));
        rows.push(SparseRow::new(b.clone(), 2017, 5, 2));

        let records = completeness_records("flu.parquet", &rows, PeriodKind::Monthly);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].observed_period_count, 12);
        assert_eq!(records[1].observed_period_count, 2);

        let short = short_series(&records, PeriodKind::Monthly);
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].region_id, "0102");
        assert_eq!(short[0].source, "flu.parquet");
    }
}
