//! Logging helpers for file operations and pipeline stages
//!
//! Thin wrappers over the `log` macros so every reader and writer reports
//! in the same format.

use std::path::Path;
use std::time::Duration;

/// Log an operation start with consistent format
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. "read" or "wrote"
/// * `path` - File that was operated on
/// * `rows` - Number of rows processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {operation} {rows} rows at {} in {duration:?}",
            path.display()
        ),
        None => log::info!("Successfully {operation} {rows} rows at {}", path.display()),
    }
}

/// Log a pipeline stage result for one source table
pub fn log_stage(source: &str, stage: &str, detail: &str) {
    log::info!("[{source}] {stage}: {detail}");
}

/// Log a warning with an optional related path
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
