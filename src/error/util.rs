//! Utility functions for error handling
//!
//! Path-annotated helpers for opening input tables and preparing output
//! directories.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{IncidenceError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(IncidenceError::path_io(
            path,
            format!("File not found (needed for: {purpose})"),
        ));
    }

    if !path.is_file() {
        return Err(IncidenceError::path_io(
            path,
            format!("Path is not a file (expected a file for: {purpose})"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to open file for {purpose}: {e}"),
        };
        IncidenceError::path_io(path, context)
    })
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::InvalidData => {
                "File contains invalid UTF-8 data - cannot read as text".to_string()
            }
            _ => format!("Failed to read file content for {purpose}: {e}"),
        };
        IncidenceError::path_io(path, context)
    })?;
    Ok(content)
}

/// Safely create a file, creating missing parent directories
pub fn safe_create_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent, purpose)?;
        }
    }

    fs::File::create(path).map_err(|e| {
        IncidenceError::path_io(path, format!("Failed to create file for {purpose}: {e}"))
    })
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(IncidenceError::path_io(
            path,
            format!("Directory not found (needed for: {purpose})"),
        ));
    }

    if !path.is_dir() {
        return Err(IncidenceError::path_io(
            path,
            format!("Path is not a directory (expected a directory for: {purpose})"),
        ));
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check directory permissions".to_string()
                }
                _ => format!("Failed to access directory for {purpose}: {e}"),
            };
            Err(IncidenceError::path_io(path, context))
        }
    }
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_directory(path: &Path, purpose: &str) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        IncidenceError::path_io(path, format!("Failed to create directory for {purpose}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/definitely/not/here.parquet");
        let err = safe_open_file(path, "incidence table").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/definitely/not/here.parquet"));
        assert!(message.contains("incidence table"));
    }

    #[test]
    fn validate_directory_rejects_files() {
        let dir = std::env::temp_dir().join("incidence_lag_util_test");
        ensure_directory(&dir, "test").unwrap();
        let file = dir.join("plain.txt");
        fs::write(&file, b"x").unwrap();

        assert!(validate_directory(&dir, "test").is_ok());
        assert!(validate_directory(&file, "test").is_err());
    }
}
