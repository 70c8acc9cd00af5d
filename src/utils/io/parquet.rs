//! Parquet file operations
//!
//! Reading Parquet files into Arrow record batches and writing serde
//! records back out through `serde_arrow`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow_schema::{FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::error::util::{safe_create_file, safe_open_file, validate_directory};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("PARQUET_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}

/// Read a parquet file into Arrow record batches
///
/// # Errors
/// Returns an error if the file cannot be opened or if the Parquet file is invalid
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = safe_open_file(path, "parquet input")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let rows = batches.iter().map(RecordBatch::num_rows).sum();

    log_operation_complete("read", path, rows, Some(start.elapsed()));
    Ok(batches)
}

/// Find all Parquet files in a directory, sorted by file name
///
/// # Errors
/// Returns an error if the directory cannot be read
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir, "parquet input directory")?;

    let files = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
        .sorted()
        .collect_vec();

    if files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    }
    Ok(files)
}

/// Convert serializable records into one record batch
///
/// The schema is traced from the record type, so an empty slice still
/// yields a batch with the right columns.
///
/// # Errors
/// Returns an error if the record type cannot be represented in Arrow
pub fn records_to_batch<T: Serialize + DeserializeOwned>(
    records: &[T],
) -> Result<RecordBatch> {
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default().allow_null_fields(true))?;
    Ok(serde_arrow::to_record_batch(&fields, &records)?)
}

/// Write a record batch to a Parquet file
///
/// # Errors
/// Returns an error if the file cannot be created or written
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let start = Instant::now();
    let file = safe_create_file(path, "parquet output")?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let schema: Arc<Schema> = batch.schema();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}

/// Write serializable records to a Parquet file
///
/// # Errors
/// Returns an error if conversion or writing fails
pub fn write_records<T: Serialize + DeserializeOwned>(
    path: &Path,
    records: &[T],
) -> Result<()> {
    let batch = records_to_batch(records)?;
    write_batch(path, &batch)
}
