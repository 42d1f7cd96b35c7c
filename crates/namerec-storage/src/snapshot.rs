use namerec_core::FeatureIndex;

use crate::error::StorageError;

/// A feature index and the weights trained against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    features: FeatureIndex,
    weights: Vec<f64>,
}

impl ModelSnapshot {
    pub fn new(features: FeatureIndex, weights: Vec<f64>) -> Result<Self, StorageError> {
        if features.len() != weights.len() {
            return Err(StorageError::DimensionMismatch {
                features: features.len(),
                weights: weights.len(),
            });
        }
        Ok(ModelSnapshot { features, weights })
    }

    pub fn features(&self) -> &FeatureIndex {
        &self.features
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn into_parts(self) -> (FeatureIndex, Vec<f64>) {
        (self.features, self.weights)
    }
}
