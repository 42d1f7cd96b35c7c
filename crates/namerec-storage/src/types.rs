//! Storage-layer types for model identity and metadata.
//!
//! [`ModelId`] lives here rather than in namerec-core because a model only
//! gains an identity once it is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a stored model. Aligns with SQLite's
/// `INTEGER PRIMARY KEY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub i64);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of a stored model (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: ModelId,
    pub name: String,
    /// Weight-vector dimension.
    pub features: usize,
    /// Hex-encoded blake3 fingerprint of the feature index.
    pub fingerprint: String,
}
