//! Error types for wirecrate

use thiserror::Error;

/// Main error type for wirecrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for wirecrate operations
pub type Result<T> = std::result::Result<T, Error>;
