use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading inputs or writing the report.
///
/// Join mismatches and an empty commodity filter are not errors: they show up
/// as null cells and empty tables respectively.
#[derive(Debug, Error)]
pub enum FootprintError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {} as CSV: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: arrow2::error::Error,
    },

    #[error("{} has no column `{column}`", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: column `{column}` row {row}: `{value}` is not a number", .path.display())]
    InvalidValue {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("{}: column `{column}` has unsupported type {data_type}", .path.display())]
    UnsupportedType {
        path: PathBuf,
        column: String,
        data_type: String,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("cannot write report to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: arrow2::error::Error,
    },
}

pub type Result<T> = std::result::Result<T, FootprintError>;
