//! Error types for scoring, weight updates, and training.

/// Errors produced by the learning core.
///
/// Every variant is a caller contract violation; inference itself cannot
/// fail, and "no evidence" situations (unknown feature keys, empty candidate
/// sets, name collisions) are ordinary outcomes rather than errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LearnError {
    #[error("assignment has {got} labels but the program has {expected} nodes")]
    LengthMismatch { expected: usize, got: usize },

    #[error("weight vector has {got} entries but the feature index has {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid weight bounds: [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("cannot train on an empty corpus")]
    EmptyCorpus,

    #[error("step-size schedule ran out at iteration {iteration}")]
    ScheduleExhausted { iteration: usize },
}
