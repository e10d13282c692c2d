use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a trough export into an isotherm record.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("isotherm file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed isotherm data in {}", path.display())]
    DataFormat {
        path: PathBuf,
        #[source]
        source: DataFormatError,
    },

    #[error("concentration ({concentration} mM) and volume ({volume} uL) must be positive")]
    InvalidScale { concentration: f64, volume: f64 },
}

/// What was wrong with the rows of an export. Lines are 1-based file lines.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("no data rows after the header")]
    Empty,

    #[error("line {line}: expected at least {expected} columns, found {found}")]
    TooFewColumns {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}, column {column}: '{value}' is not a number")]
    InvalidNumber {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line}: unreadable row")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },
}
