//! Error types and handling
//!
//! Collaborator failures (document store, message broker) are converted to
//! these variants at the point of use. Nothing here escapes the dispatcher:
//! every request is answered with a complete response envelope, and these
//! errors only ever become envelope fields or log entries.

use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Document store error
    #[error("Database error: {0}")]
    Database(String),

    /// Message broker error
    #[error("Broker error: {0}")]
    Broker(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From for common error types

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for AppError {
    fn from(err: bson::ser::Error) -> Self {
        AppError::Database(format!("BSON encoding error: {}", err))
    }
}

impl From<bson::de::Error> for AppError {
    fn from(err: bson::de::Error) -> Self {
        AppError::Database(format!("BSON decoding error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Broker(err.to_string())
    }
}

/// Result type alias for store and service operations
pub type AppResult<T> = Result<T, AppError>;
