//! Storage error types for namerec-storage.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    /// A model with the given ID was not found.
    #[error("model not found: {0}")]
    ModelNotFound(i64),

    /// The stored fingerprint disagrees with the stored feature rows.
    #[error("fingerprint mismatch for model {model}: stored {stored}, computed {computed}")]
    FingerprintMismatch {
        model: i64,
        stored: String,
        computed: String,
    },

    /// Weight vector and feature index disagree in length.
    #[error("{weights} weights for {features} features")]
    DimensionMismatch { features: usize, weights: usize },

    /// A data integrity violation was detected.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
