//! Error types for math pool generation

use thiserror::Error;

/// Math pool error type
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Hit-rate targeting: {0}")]
    HitRate(String),

    #[error("ticket_count must be > 0 (got {0})")]
    InvalidTicketCount(usize),

    #[error("Duplicate artifact: {0}")]
    DuplicateArtifact(String),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PoolError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias
pub type PoolResult<T> = Result<T, PoolError>;
