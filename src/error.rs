//! Error types for tsql-lineage
//!
//! Only the file-system boundary can fail. Parsing and generation are
//! best-effort and return plain values.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading inputs or writing results
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Failed to read schema file: {path}")]
    SchemaReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema file: {path}")]
    SchemaParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan directory: {path}")]
    DirectoryScanError {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to write output to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object not found in schema: {id}")]
    ObjectNotFound { id: String },
}
