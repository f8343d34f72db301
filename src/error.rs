//! Error types for mxe

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mxe operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read template file {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed template row at line {line}: {reason}")]
    MalformedTemplate { line: usize, reason: String },

    #[error("Unknown data type: '{0}'")]
    UnknownDataType(String),

    #[error("Invalid value '{value}' for data type {data_type}: {reason}")]
    InvalidValue {
        value: String,
        data_type: String,
        reason: String,
    },

    #[error("Invalid MXE file: {0}")]
    InvalidMxe(String),

    #[error("Invalid XLB file: {0}")]
    InvalidXlb(String),

    #[error("Invalid record table header: {0}")]
    TableHeader(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for mxe operations
pub type Result<T> = std::result::Result<T, Error>;
