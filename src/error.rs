//! Error types for shardroute
//!
//! Provides a unified error type for rule construction, routing and key generation.

use thiserror::Error;

/// Result type alias using ShardingError
pub type Result<T> = std::result::Result<T, ShardingError>;

/// Unified error type for shardroute operations
#[derive(Debug, Error)]
pub enum ShardingError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// Malformed or self-contradictory configuration, or an accessor that
    /// requires a table that is not configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Null/empty required constructor arguments
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    // -------------------------------------------------------------------------
    // Parse Errors
    // -------------------------------------------------------------------------
    #[error("Format error: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // Routing Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid sharding value: {0}")]
    InvalidShardingValue(String),

    // -------------------------------------------------------------------------
    // Key Generation Errors
    // -------------------------------------------------------------------------
    #[error("Clock is moving backwards, last time is {last} milliseconds, current time is {current} milliseconds")]
    ClockBackwards { last: i64, current: i64 },

    // -------------------------------------------------------------------------
    // Config File Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShardingError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ShardingError::Configuration(_))
    }

    pub fn is_illegal_argument(&self) -> bool {
        matches!(self, ShardingError::IllegalArgument(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, ShardingError::Format(_))
    }
}

impl From<serde_json::Error> for ShardingError {
    fn from(e: serde_json::Error) -> Self {
        ShardingError::Serialization(e.to_string())
    }
}
