//! Custom error types for the aggregation and progress engine.

use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("store error: {0}")]
    Store(#[from] devotion_store::StoreError),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for engine operations.
pub type FeedResult<T> = Result<T, FeedError>;
