//! Column extractors returning one `Option` per row
//!
//! Null cells come back as `None`; the caller decides whether a null is a
//! missing value or an error.

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::arrow::array_utils::{downcast_array, require_column};

/// Extract a column as 64-bit integers
pub fn extract_int64(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<i64>>> {
    let column = require_column(batch, column_name, &DataType::Int64)?;
    let values = downcast_array::<Int64Array>(&column, column_name)?;
    Ok(values.iter().collect())
}

/// Extract a column as 64-bit floats
pub fn extract_float64(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(batch, column_name, &DataType::Float64)?;
    let values = downcast_array::<Float64Array>(&column, column_name)?;
    Ok(values.iter().collect())
}

/// Extract a column as strings; numeric columns are rendered in decimal
pub fn extract_string(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let column = require_column(batch, column_name, &DataType::Utf8)?;
    let values = downcast_array::<StringArray>(&column, column_name)?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

/// Names of the columns of `batch` not listed in `exclude`
#[must_use]
pub fn other_columns(batch: &RecordBatch, exclude: &[&str]) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|name| !exclude.contains(&name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn numeric_codes_become_strings() {
        let schema = Schema::new(vec![
            Field::new("ID1_CITY", DataType::Int32, true),
            Field::new("case_c", DataType::Int32, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int32Array::from(vec![Some(101), None])),
                Arc::new(Int32Array::from(vec![Some(4), Some(5)])),
            ],
        )
        .unwrap();

        let codes = extract_string(&batch, "ID1_CITY").unwrap();
        assert_eq!(codes, vec![Some("101".to_string()), None]);
        let cases = extract_float64(&batch, "case_c").unwrap();
        assert_eq!(cases, vec![Some(4.0), Some(5.0)]);
        assert_eq!(other_columns(&batch, &["ID1_CITY"]), vec!["case_c".to_string()]);
    }
}
