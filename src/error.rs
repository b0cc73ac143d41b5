//! Error types for reading point clouds and writing planes.
//!
//! The estimator itself never fails: degenerate samples and missing consensus
//! are reported as `None`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Expected {expected} points, found {found}")]
    PointCount { expected: usize, found: usize },

    #[error("Malformed LAS file: {0}")]
    Las(String),

    #[error("Compressed LAS (LAZ) files are not supported")]
    CompressedLas,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
