//! Linear scores and feature indicator vectors.
//!
//! Every edge contributes the weight of the key its endpoints form under a
//! label assignment. Keys the model has never seen contribute nothing.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use namerec_core::{FeatureId, Label, ProgramGraph};
use petgraph::graph::EdgeIndex;

use crate::error::LearnError;
use crate::model::Model;

/// Sparse real vector over feature ids, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<FeatureId, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        SparseVector::default()
    }

    pub fn get(&self, id: FeatureId) -> f64 {
        self.entries.get(&id).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, id: FeatureId, value: f64) {
        *self.entries.entry(id).or_insert(0.0) += value;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (FeatureId, f64)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scale(&mut self, factor: f64) {
        for value in self.entries.values_mut() {
            *value *= factor;
        }
    }

    /// Drops entries that are exactly zero.
    pub fn prune(&mut self) {
        self.entries.retain(|_, value| *value != 0.0);
    }

    /// `self - other`, without zero entries.
    pub fn difference(&self, other: &SparseVector) -> SparseVector {
        let mut out = self.clone();
        for (id, value) in other.iter() {
            out.add(id, -value);
        }
        out.prune();
        out
    }
}

impl AddAssign<&SparseVector> for SparseVector {
    fn add_assign(&mut self, other: &SparseVector) {
        for (id, value) in other.iter() {
            self.add(id, value);
        }
    }
}

fn check_length(program: &ProgramGraph, labels: &[Label]) -> Result<(), LearnError> {
    if labels.len() != program.node_count() {
        return Err(LearnError::LengthMismatch {
            expected: program.node_count(),
            got: labels.len(),
        });
    }
    Ok(())
}

/// Sum of edge weights under `labels`.
pub fn score(model: &Model, program: &ProgramGraph, labels: &[Label]) -> Result<f64, LearnError> {
    check_length(program, labels)?;
    Ok(program
        .edges()
        .map(|edge| edge_weight(model, program, labels, edge))
        .sum())
}

/// Per-feature edge counts under `labels`.
pub fn indicator(
    model: &Model,
    program: &ProgramGraph,
    labels: &[Label],
) -> Result<SparseVector, LearnError> {
    check_length(program, labels)?;
    let mut counts = SparseVector::new();
    for edge in program.edges() {
        if let Some(id) = model.features().get(&program.feature_key(edge, labels)) {
            counts.add(id, 1.0);
        }
    }
    Ok(counts)
}

/// [`score`] restricted to `edges`. Callers guarantee `labels` matches the
/// program.
pub fn score_edges(
    model: &Model,
    program: &ProgramGraph,
    labels: &[Label],
    edges: &[EdgeIndex<u32>],
) -> f64 {
    edges
        .iter()
        .map(|&edge| edge_weight(model, program, labels, edge))
        .sum()
}

fn edge_weight(
    model: &Model,
    program: &ProgramGraph,
    labels: &[Label],
    edge: EdgeIndex<u32>,
) -> f64 {
    model
        .features()
        .get(&program.feature_key(edge, labels))
        .map_or(0.0, |id| model.weight(id))
}
