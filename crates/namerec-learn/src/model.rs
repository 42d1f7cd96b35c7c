//! Weight vector, feature index, and candidate ranking as one unit.

use namerec_core::{FeatureId, FeatureIndex};

use crate::candidates::CandidateIndex;
use crate::error::LearnError;
use crate::scoring::SparseVector;

/// Closed box every weight is projected into after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    /// Fails unless both ends are finite and `lower <= upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, LearnError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(LearnError::InvalidBounds { lower, upper });
        }
        Ok(Bounds { lower, upper })
    }

    /// Smallest allowed weight.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Largest allowed weight.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Projects a single weight into the box.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    /// Clamps every weight in place.
    pub fn project(&self, weights: &mut [f64]) {
        for weight in weights {
            *weight = self.clamp(*weight);
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            lower: 0.0,
            upper: 0.5,
        }
    }
}

/// A trained (or training) linear model over feature keys.
///
/// The candidate ranking is rebuilt on every weight write, so it can never
/// lag behind the weights it was ranked by. [`set_weights`](Self::set_weights)
/// and [`apply_step`](Self::apply_step) are the only ways to change weights.
#[derive(Debug, Clone)]
pub struct Model {
    features: FeatureIndex,
    weights: Vec<f64>,
    candidates: CandidateIndex,
}

impl Model {
    /// A model with every weight at `value`.
    pub fn uniform(features: FeatureIndex, value: f64) -> Self {
        let weights = vec![value; features.len()];
        let candidates = CandidateIndex::build(&features, &weights);
        Model {
            features,
            weights,
            candidates,
        }
    }

    /// A model over explicit weights, one per feature in index order.
    pub fn with_weights(features: FeatureIndex, weights: Vec<f64>) -> Result<Self, LearnError> {
        check_dimension(&features, weights.len())?;
        let candidates = CandidateIndex::build(&features, &weights);
        Ok(Model {
            features,
            weights,
            candidates,
        })
    }

    pub fn features(&self) -> &FeatureIndex {
        &self.features
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn candidates(&self) -> &CandidateIndex {
        &self.candidates
    }

    pub fn weight(&self, id: FeatureId) -> f64 {
        self.weights[id.index()]
    }

    /// Euclidean norm of the weight vector.
    pub fn l2_norm(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Replaces the weights and re-ranks.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), LearnError> {
        check_dimension(&self.features, weights.len())?;
        self.weights = weights;
        self.candidates.rerank(&self.weights);
        Ok(())
    }

    /// `w <- project(w - step * gradient)`, then re-ranks.
    pub fn apply_step(
        &mut self,
        gradient: &SparseVector,
        step: f64,
        bounds: Bounds,
    ) -> Result<(), LearnError> {
        if let Some((id, _)) = gradient.iter().next_back() {
            if id.index() >= self.weights.len() {
                return Err(LearnError::DimensionMismatch {
                    expected: self.weights.len(),
                    got: id.index() + 1,
                });
            }
        }
        for (id, value) in gradient.iter() {
            self.weights[id.index()] -= step * value;
        }
        bounds.project(&mut self.weights);
        self.candidates.rerank(&self.weights);
        Ok(())
    }

    pub fn into_parts(self) -> (FeatureIndex, Vec<f64>) {
        (self.features, self.weights)
    }
}

fn check_dimension(features: &FeatureIndex, got: usize) -> Result<(), LearnError> {
    if features.len() != got {
        return Err(LearnError::DimensionMismatch {
            expected: features.len(),
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use namerec_core::{EdgeKind, FeatureKey};
    use proptest::prelude::*;

    fn features() -> FeatureIndex {
        let mut index = FeatureIndex::new();
        index.insert(FeatureKey::new("a", "call", "b"), EdgeKind::VarVar);
        index.insert(FeatureKey::new("a", "call", "c"), EdgeKind::VarVar);
        index
    }

    fn first_name(model: &Model) -> &str {
        &model.candidates().ranked("a", "call")[0].name
    }

    #[test]
    fn bounds_reject_inverted_or_non_finite() {
        assert!(Bounds::new(0.0, 0.5).is_ok());
        assert!(Bounds::new(0.3, 0.3).is_ok());
        assert_eq!(
            Bounds::new(1.0, 0.0),
            Err(LearnError::InvalidBounds {
                lower: 1.0,
                upper: 0.0
            })
        );
        assert!(Bounds::new(f64::NAN, 1.0).is_err());
        assert!(Bounds::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn with_weights_checks_dimension() {
        let err = Model::with_weights(features(), vec![0.1]).unwrap_err();
        assert_eq!(
            err,
            LearnError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn set_weights_reranks() {
        let mut model = Model::with_weights(features(), vec![0.2, 0.1]).unwrap();
        assert_eq!(first_name(&model), "b");
        model.set_weights(vec![0.1, 0.2]).unwrap();
        assert_eq!(first_name(&model), "c");
        assert!(model.set_weights(vec![0.0; 3]).is_err());
        assert_eq!(model.weights(), &[0.1, 0.2]);
    }

    #[test]
    fn apply_step_moves_against_gradient_projects_and_reranks() {
        let mut model = Model::uniform(features(), 0.15);
        let mut gradient = SparseVector::new();
        gradient.add(FeatureId(1), -10.0);
        gradient.add(FeatureId(0), 1.0);
        model.apply_step(&gradient, 0.1, Bounds::default()).unwrap();
        assert!((model.weights()[0] - 0.05).abs() < 1e-12);
        assert_eq!(model.weights()[1], 0.5);
        assert_eq!(first_name(&model), "c");
    }

    #[test]
    fn apply_step_rejects_out_of_range_feature() {
        let mut model = Model::uniform(features(), 0.15);
        let mut gradient = SparseVector::new();
        gradient.add(FeatureId(7), 1.0);
        assert!(matches!(
            model.apply_step(&gradient, 0.1, Bounds::default()),
            Err(LearnError::DimensionMismatch { expected: 2, got: 8 })
        ));
        assert_eq!(model.weights(), &[0.15, 0.15]);
    }

    #[test]
    fn l2_norm() {
        let model = Model::with_weights(features(), vec![0.3, 0.4]).unwrap();
        assert!((model.l2_norm() - 0.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn projection_is_idempotent_and_in_range(
            lower in -5.0f64..5.0,
            width in 0.0f64..5.0,
            values in proptest::collection::vec(-100.0f64..100.0, 0..32),
        ) {
            let bounds = Bounds::new(lower, lower + width).unwrap();
            let mut once = values.clone();
            bounds.project(&mut once);
            for w in &once {
                prop_assert!(*w >= bounds.lower() && *w <= bounds.upper());
            }
            let mut twice = once.clone();
            bounds.project(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
