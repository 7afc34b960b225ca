//! Common error types for Big Board

use thiserror::Error;

/// Common result type for Big Board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Big Board crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested item, category or member does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before anything is written
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
