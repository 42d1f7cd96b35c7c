//! Structured prediction over naming graphs.
//!
//! - [`model`]: the feature index, its weight vector, and the candidate
//!   ranking kept in step with it.
//! - [`scoring`]: linear scores and indicator vectors of label assignments.
//! - [`inference`]: greedy loss-augmented decoding over one program.
//! - [`trainer`]: projected subgradient descent over a corpus.

pub mod candidates;
pub mod error;
pub mod inference;
pub mod loss;
pub mod model;
pub mod schedule;
pub mod scoring;
pub mod trainer;

pub use candidates::{Candidate, CandidateIndex};
pub use error::LearnError;
pub use inference::{AcceptPolicy, InferenceConfig, InferenceEngine};
pub use loss::{correct, HammingLoss, Loss, ZeroLoss};
pub use model::{Bounds, Model};
pub use schedule::{StepSchedule, Steps};
pub use scoring::{indicator, score, score_edges, SparseVector};
pub use trainer::{Subgradient, TrainOutcome, Trainer, TrainerConfig};
