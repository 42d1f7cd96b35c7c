//! Naming graphs for variable-name recovery.
//!
//! A corpus document becomes a [`ProgramGraph`]: variable occurrences joined
//! by relation-labelled edges to each other and to literals. Label hypotheses
//! live in an [`Assignment`] beside the graph, never inside it, and every
//! edge key observed under the ground truth is registered in a
//! [`FeatureIndex`].

pub mod assignment;
pub mod corpus;
pub mod error;
pub mod feature;
pub mod id;
pub mod label;
pub mod program;

// Re-export commonly used types
pub use assignment::{Assignment, PlaceholderTokens};
pub use corpus::Corpus;
pub use error::IngestError;
pub use feature::{FeatureIndex, FeatureKey, FeatureKeyRef};
pub use id::{FeatureId, NodeId, ScopeId};
pub use label::{Label, DIVIDER};
pub use program::{EdgeKind, ProgramGraph, Relation, Vertex};
