//! Error types for the inventory tracker

use thiserror::Error;

/// Unified error type for store and policy operations
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Malformed or out-of-range input, rejected before any store access
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias for inventory tracker operations
pub type Result<T> = std::result::Result<T, InventoryError>;
