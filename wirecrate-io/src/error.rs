//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur during I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Unexpected end of file: expected {expected} {element} lines, found {found}")]
    Truncated {
        element: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Unexpected data at line {line} after all declared elements")]
    TrailingData { line: usize },

    #[error("Unsupported element: {0}")]
    UnsupportedElement(String),

    #[error("Placeholder too small for count {0}")]
    CountOverflow(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error(transparent)]
    Core(#[from] wirecrate_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
