//! Readers for the input tables of the analysis
//!
//! Each reader maps the configured column names onto the crate's row
//! types. Rows with a null key column are skipped and counted; the count is
//! logged once per file.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use log::{debug, warn};

use crate::config::{ExposureColumns, IncidenceColumns, NameColumns, PopulationColumns};
use crate::error::Result;
use crate::models::{
    Observation, PairedRow, PopulationTable, RegionId, RegionNames, SparseRow,
    SpatialUnit,
};
use crate::utils::arrow::{extract_float64, extract_int64, extract_string, other_columns};
use crate::utils::io::parquet::read_parquet;

/// Region codes of a column; integer and string columns are both accepted
///
/// Codes that cannot be normalized come back as `None` and are logged.
pub fn extract_region_codes(batch: &RecordBatch, column: &str) -> Result<Vec<Option<RegionId>>> {
    let schema = batch.schema();
    let numeric = schema
        .field_with_name(column)
        .is_ok_and(|f| f.data_type().is_integer() || f.data_type().is_floating());

    let parsed = if numeric {
        extract_int64(batch, column)?
            .into_iter()
            .map(|code| code.map(RegionId::from_code))
            .collect::<Vec<_>>()
    } else {
        extract_string(batch, column)?
            .into_iter()
            .map(|code| code.map(|c| RegionId::parse(&c)))
            .collect()
    };

    Ok(parsed
        .into_iter()
        .map(|code| match code {
            Some(Ok(region)) => Some(region),
            Some(Err(e)) => {
                warn!("Skipping row: {e}");
                None
            }
            None => None,
        })
        .collect())
}

fn to_year(value: Option<i64>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn to_period(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// Non-negative whole counts; fractional values are rounded half to even
fn to_count(value: Option<f64>) -> Option<u64> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round_ties_even() as u64)
}

fn report_skipped(path: &Path, skipped: usize, table: &str) {
    if skipped > 0 {
        warn!(
            "Skipped {skipped} {table} rows with missing or invalid keys in {}",
            path.display()
        );
    }
}

/// Read an incidence table into sparse rows
///
/// Columns other than the four configured ones are carried as attributes.
pub fn read_incidence(path: &Path, columns: &IncidenceColumns) -> Result<Vec<SparseRow>> {
    let mut rows = Vec::new();
    let mut skipped = 0;

    for batch in read_parquet(path)? {
        let regions = extract_region_codes(&batch, &columns.region)?;
        let years = extract_int64(&batch, &columns.year)?;
        let periods = extract_int64(&batch, &columns.period)?;
        let counts = extract_float64(&batch, &columns.count)?;

        let key_columns = [
            columns.region.as_str(),
            columns.year.as_str(),
            columns.period.as_str(),
            columns.count.as_str(),
        ];
        let mut attribute_columns = Vec::new();
        for name in other_columns(&batch, &key_columns) {
            match extract_string(&batch, &name) {
                Ok(values) => attribute_columns.push((name, values)),
                Err(e) => debug!("Column '{name}' is not carried as an attribute: {e}"),
            }
        }

        for (i, region) in regions.into_iter().enumerate() {
            let (Some(region), Some(year), Some(period), Some(count)) = (
                region,
                to_year(years[i]),
                to_period(periods[i]),
                to_count(counts[i]),
            ) else {
                skipped += 1;
                continue;
            };

            let mut row = SparseRow::new(region, year, period, count);
            for (name, values) in &attribute_columns {
                if let Some(value) = &values[i] {
                    row = row.with_attribute(name.clone(), value.clone());
                }
            }
            rows.push(row);
        }
    }

    report_skipped(path, skipped, "incidence");
    Ok(rows)
}

/// Read a population table; duplicate (region, year) rows are summed
pub fn read_population(path: &Path, columns: &PopulationColumns) -> Result<PopulationTable> {
    let mut table = PopulationTable::new();
    let mut skipped = 0;

    for batch in read_parquet(path)? {
        let regions = extract_region_codes(&batch, &columns.region)?;
        let years = extract_int64(&batch, &columns.year)?;
        let populations = extract_float64(&batch, &columns.population)?;

        for (i, region) in regions.into_iter().enumerate() {
            match (region, to_year(years[i]), to_count(populations[i])) {
                (Some(region), Some(year), Some(population)) => {
                    table.add(region, year, population);
                }
                _ => skipped += 1,
            }
        }
    }

    report_skipped(path, skipped, "population");
    Ok(table)
}

/// Read a region code to place name table
pub fn read_names(path: &Path, columns: &NameColumns) -> Result<RegionNames> {
    let mut names = RegionNames::new();
    let mut skipped = 0;

    for batch in read_parquet(path)? {
        let regions = extract_region_codes(&batch, &columns.region)?;
        let labels = extract_string(&batch, &columns.name)?;

        for (region, label) in regions.into_iter().zip(labels) {
            match (region, label) {
                (Some(region), Some(label)) if !label.trim().is_empty() => {
                    names.insert(region, label);
                }
                _ => skipped += 1,
            }
        }
    }

    report_skipped(path, skipped, "name");
    Ok(names)
}

/// Read an exposure table into observations; null exposure values are skipped
pub fn read_exposure(path: &Path, columns: &ExposureColumns) -> Result<Vec<Observation>> {
    let mut observations = Vec::new();
    let mut skipped = 0;

    for batch in read_parquet(path)? {
        let units = extract_string(&batch, &columns.unit)?;
        let years = extract_int64(&batch, &columns.year)?;
        let periods = extract_int64(&batch, &columns.period)?;
        let values = extract_float64(&batch, &columns.exposure)?;

        for (i, unit) in units.into_iter().enumerate() {
            match (unit, to_year(years[i]), to_period(periods[i]), values[i]) {
                (Some(unit), Some(year), Some(period), Some(value)) if value.is_finite() => {
                    observations.push(Observation::new(unit, year, period, value));
                }
                _ => skipped += 1,
            }
        }
    }

    report_skipped(path, skipped, "exposure");
    Ok(observations)
}

/// Read a table carrying both outcome and exposure columns
///
/// Missing outcome or exposure values are kept as `None`; the scan input
/// drops them.
pub fn read_paired(path: &Path, columns: &ExposureColumns) -> Result<Vec<PairedRow>> {
    let mut rows = Vec::new();
    let mut skipped = 0;

    for batch in read_parquet(path)? {
        let units = extract_string(&batch, &columns.unit)?;
        let years = extract_int64(&batch, &columns.year)?;
        let periods = extract_int64(&batch, &columns.period)?;
        let exposures = extract_float64(&batch, &columns.exposure)?;
        let outcomes = extract_float64(&batch, &columns.outcome)?;

        for (i, unit) in units.into_iter().enumerate() {
            let (Some(unit), Some(year), Some(period)) =
                (unit, to_year(years[i]), to_period(periods[i]))
            else {
                skipped += 1;
                continue;
            };
            rows.push(PairedRow {
                unit: SpatialUnit::new(unit),
                year,
                period,
                outcome: outcomes[i].filter(|v| v.is_finite()),
                exposure: exposures[i].filter(|v| v.is_finite()),
            });
        }
    }

    report_skipped(path, skipped, "paired");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IncidenceColumns;
    use crate::models::PeriodKind;
    use crate::utils::io::parquet::write_batch;
    use arrow::array::{Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("incidence-lag-tables-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn incidence_rows_with_integer_codes() {
        let schema = Schema::new(vec![
            Field::new("ID1_CITY", DataType::Int64, true),
            Field::new("year", DataType::Int32, true),
            Field::new("week", DataType::Int32, true),
            Field::new("case_c", DataType::Float64, true),
            Field::new("sex", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(101), Some(6301), None])),
                Arc::new(Int32Array::from(vec![2016, 2016, 2016])),
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![4.0, 2.0, 1.0])),
                Arc::new(StringArray::from(vec![Some("F"), None, Some("M")])),
            ],
        )
        .unwrap();
        let path = temp_path("incidence.parquet");
        write_batch(&path, &batch).unwrap();

        let rows = read_incidence(&path, &IncidenceColumns::for_kind(PeriodKind::Weekly)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region.as_str(), "0101");
        assert_eq!(rows[0].attributes.get("sex").map(String::as_str), Some("F"));
        assert_eq!(rows[1].case_count, 2);
        assert!(rows[1].attributes.is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn string_codes_are_padded() {
        let schema = Schema::new(vec![Field::new("code", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec![Some("101"), Some("x1"), None]))],
        )
        .unwrap();
        let codes = extract_region_codes(&batch, "code").unwrap();
        assert_eq!(codes[0].as_ref().map(RegionId::as_str), Some("0101"));
        assert!(codes[1].is_none());
        assert!(codes[2].is_none());
    }

    #[test]
    fn counts_are_whole_and_non_negative() {
        assert_eq!(to_count(Some(2.5)), Some(2));
        assert_eq!(to_count(Some(3.5)), Some(4));
        assert_eq!(to_count(Some(-1.0)), None);
        assert_eq!(to_count(Some(f64::NAN)), None);
    }
}
