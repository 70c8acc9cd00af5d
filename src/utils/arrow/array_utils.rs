//! Utilities for working with Arrow arrays.
//!
//! Columns are looked up by name and cast to the type the reader expects,
//! so integer codes stored as strings (or the other way round) and
//! integers of any width are accepted.

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{IncidenceError, Result};

/// Get a column from a record batch, cast to `expected_type`
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array (converted if necessary) if found
/// * `Ok(None)` - If the column is not found and `required` is false
/// * `Err(IncidenceError)` - If the column is missing and `required`, or the cast fails
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
    required: bool,
) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(column_name) else {
        if required {
            return Err(IncidenceError::column_not_found(column_name));
        }
        debug!("Optional column '{column_name}' not found in record batch");
        return Ok(None);
    };

    let column = batch.column(idx);
    let actual_type = column.data_type();
    if actual_type == expected_type {
        return Ok(Some(column.clone()));
    }

    debug!("Casting column '{column_name}' from {actual_type:?} to {expected_type:?}");
    Ok(Some(cast(column, expected_type)?))
}

/// Get a required column cast to `expected_type`
pub fn require_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
) -> Result<ArrayRef> {
    get_column(batch, column_name, expected_type, true)?
        .ok_or_else(|| IncidenceError::column_not_found(column_name))
}

/// Downcast an array reference to a concrete array type
pub fn downcast_array<'a, T: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        IncidenceError::Config(format!(
            "Column '{column_name}' has unexpected type {:?}",
            array.data_type()
        ))
    })
}
