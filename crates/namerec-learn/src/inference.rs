//! Greedy loss-augmented decoding.
//!
//! Starting from unique placeholder names, every sweep visits the nodes in
//! order and tries the top-ranked candidates proposed by each incident edge's
//! signature. A candidate is kept when it raises the node's local objective
//! (incident edge score plus loss against the ground truth) per the
//! [`AcceptPolicy`]. This approximates, and does not solve, the MAP problem.

use indexmap::IndexSet;

use namerec_core::{Assignment, Label, NodeId, PlaceholderTokens, ProgramGraph};

use crate::loss::Loss;
use crate::model::Model;
use crate::scoring::score_edges;

/// When a speculative relabel replaces the current baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceptPolicy {
    /// `new > baseline`
    #[default]
    StrictImprovement,
    /// `new >= baseline`; on ties the last candidate tried wins.
    NotWorse,
}

impl AcceptPolicy {
    pub fn accepts(self, candidate: f64, baseline: f64) -> bool {
        match self {
            AcceptPolicy::StrictImprovement => candidate > baseline,
            AcceptPolicy::NotWorse => candidate >= baseline,
        }
    }
}

/// Search effort and acceptance rule for [`InferenceEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Full passes over the nodes. There is no convergence check.
    pub sweeps: usize,
    /// Candidates taken from each incident edge's ranking.
    pub top_candidates: usize,
    pub accept: AcceptPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            sweeps: 20,
            top_candidates: 8,
            accept: AcceptPolicy::StrictImprovement,
        }
    }
}

/// Greedy loss-augmented decoder over a borrowed [`Model`].
pub struct InferenceEngine<'m> {
    model: &'m Model,
    config: InferenceConfig,
}

impl<'m> InferenceEngine<'m> {
    pub fn new(model: &'m Model, config: InferenceConfig) -> Self {
        InferenceEngine { model, config }
    }

    /// Decodes `program` from a fresh placeholder sequence.
    pub fn infer<L: Loss + ?Sized>(&self, program: &ProgramGraph, loss: &L) -> Assignment {
        self.infer_with(program, loss, &mut PlaceholderTokens::new())
    }

    /// Decodes `program`, seeding the initial hypothesis from `tokens`.
    ///
    /// The result has one label per node, in node order, with every scope
    /// taken from the ground truth.
    pub fn infer_with<L: Loss + ?Sized>(
        &self,
        program: &ProgramGraph,
        loss: &L,
        tokens: &mut PlaceholderTokens,
    ) -> Assignment {
        let truth = program.truth();
        let mut current = Assignment::placeholders(truth, tokens);
        let mut proposals: IndexSet<&'m str> = IndexSet::new();
        let mut accepted = 0usize;

        for _ in 0..self.config.sweeps {
            for node in program.nodes() {
                self.collect_proposals(program, &current, node, &mut proposals);
                if proposals.is_empty() {
                    continue;
                }

                let incident = program.incident_edges(node);
                let mut baseline = self.objective(program, truth, &current, incident, loss);
                for &name in &proposals {
                    if current.is_taken(node, name) {
                        continue;
                    }
                    let previous = current.relabel(node, name.to_string());
                    let candidate = self.objective(program, truth, &current, incident, loss);
                    if self.config.accept.accepts(candidate, baseline) {
                        baseline = candidate;
                        accepted += 1;
                    } else {
                        current.relabel(node, previous);
                    }
                }
            }
        }

        tracing::trace!(
            nodes = program.node_count(),
            sweeps = self.config.sweeps,
            accepted,
            "inference finished"
        );
        current
    }

    /// Union, in first-seen order, of the top candidates for each incident
    /// edge's signature under `current`.
    fn collect_proposals(
        &self,
        program: &ProgramGraph,
        current: &Assignment,
        node: NodeId,
        proposals: &mut IndexSet<&'m str>,
    ) {
        proposals.clear();
        let candidates = self.model.candidates();
        for &edge in program.incident_edges(node) {
            let anchor = program.anchor(edge, node, current.labels());
            let relation = &program.relation(edge).sequence;
            for candidate in candidates.top(anchor, relation, self.config.top_candidates) {
                proposals.insert(candidate.name.as_str());
            }
        }
    }

    fn objective<L: Loss + ?Sized>(
        &self,
        program: &ProgramGraph,
        truth: &[Label],
        current: &Assignment,
        incident: &[petgraph::graph::EdgeIndex<u32>],
        loss: &L,
    ) -> f64 {
        score_edges(self.model, program, current.labels(), incident)
            + loss.loss(truth, current.labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::{HammingLoss, ZeroLoss};
    use namerec_core::{EdgeKind, FeatureIndex, FeatureKey, ScopeId};

    fn model(elem: f64, node: f64) -> Model {
        let mut features = FeatureIndex::new();
        features.insert(FeatureKey::new("elem", "arg", "document"), EdgeKind::VarLit);
        features.insert(FeatureKey::new("node", "arg", "document"), EdgeKind::VarLit);
        Model::with_weights(features, vec![elem, node]).unwrap()
    }

    /// One `var-lit` edge to `document` per truth label.
    fn program(truth: &[(u32, &str)]) -> ProgramGraph {
        let truth: Vec<Label> = truth
            .iter()
            .map(|&(scope, name)| Label::new(ScopeId(scope), name))
            .collect();
        let mut program = ProgramGraph::new(truth.clone());
        for label in &truth {
            program.add_var_lit(label, "document", "arg").unwrap();
        }
        program
    }

    fn names(assignment: &Assignment) -> Vec<&str> {
        assignment.labels().iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn selects_the_single_positive_feature() {
        let model = model(0.0, 0.4);
        let engine = InferenceEngine::new(&model, InferenceConfig::default());
        let result = engine.infer(&program(&[(0, "x")]), &ZeroLoss);
        assert_eq!(names(&result), vec!["node"]);
    }

    #[test]
    fn duplicate_names_are_blocked_within_a_scope() {
        let model = model(0.0, 0.4);
        let engine = InferenceEngine::new(&model, InferenceConfig::default());

        let same_scope = engine.infer(&program(&[(0, "x"), (0, "y")]), &ZeroLoss);
        assert_eq!(names(&same_scope), vec!["node", "ᐧ1"]);

        let split_scopes = engine.infer(&program(&[(0, "x"), (1, "y")]), &ZeroLoss);
        assert_eq!(names(&split_scopes), vec!["node", "node"]);
    }

    #[test]
    fn strict_and_not_worse_differ_on_ties() {
        let model = model(0.0, 0.0);
        let program = program(&[(0, "x")]);

        let strict = InferenceEngine::new(&model, InferenceConfig::default());
        assert_eq!(names(&strict.infer(&program, &ZeroLoss)), vec!["ᐧ0"]);

        let lenient = InferenceEngine::new(
            &model,
            InferenceConfig {
                accept: AcceptPolicy::NotWorse,
                ..InferenceConfig::default()
            },
        );
        assert_eq!(names(&lenient.infer(&program, &ZeroLoss)), vec!["node"]);
    }

    #[test]
    fn loss_augmentation_steers_away_from_the_truth() {
        // Taking "node" gains 0.4 in score but loses 1.0 in loss.
        let model = model(0.0, 0.4);
        let engine = InferenceEngine::new(&model, InferenceConfig::default());
        let result = engine.infer(&program(&[(0, "node")]), &HammingLoss);
        assert_eq!(names(&result), vec!["ᐧ0"]);
    }

    #[test]
    fn nodes_without_candidates_keep_their_placeholder() {
        let model = model(0.3, 0.4);
        let mut program = ProgramGraph::new(vec![
            Label::new(ScopeId(0), "a"),
            Label::new(ScopeId(2), "b"),
        ]);
        program
            .add_var_lit(&Label::new(ScopeId(0), "a"), "window", "ret")
            .unwrap();
        let engine = InferenceEngine::new(&model, InferenceConfig::default());
        let result = engine.infer(&program, &ZeroLoss);
        assert_eq!(names(&result), vec!["ᐧ0", "ᐧ1"]);
    }

    #[test]
    fn output_keeps_length_order_and_scopes() {
        let model = model(0.1, 0.4);
        let program = program(&[(3, "x"), (0, "y"), (3, "z")]);
        let engine = InferenceEngine::new(&model, InferenceConfig::default());
        let mut tokens = PlaceholderTokens::starting_at(10);
        let result = engine.infer_with(&program, &ZeroLoss, &mut tokens);
        assert_eq!(result.len(), program.node_count());
        let scopes: Vec<_> = result.labels().iter().map(|l| l.scope).collect();
        assert_eq!(scopes, vec![ScopeId(3), ScopeId(0), ScopeId(3)]);
        assert_eq!(names(&result), vec!["node", "node", "elem"]);
    }

    #[test]
    fn top_candidates_limits_proposals() {
        let model = model(0.1, 0.4);
        let engine = InferenceEngine::new(
            &model,
            InferenceConfig {
                top_candidates: 1,
                ..InferenceConfig::default()
            },
        );
        let result = engine.infer(&program(&[(0, "x"), (0, "y")]), &ZeroLoss);
        // "elem" is never proposed, so the second node has nowhere to go.
        assert_eq!(names(&result), vec!["node", "ᐧ1"]);
    }

    #[test]
    fn zero_sweeps_returns_placeholders() {
        let model = model(0.1, 0.4);
        let engine = InferenceEngine::new(
            &model,
            InferenceConfig {
                sweeps: 0,
                ..InferenceConfig::default()
            },
        );
        let result = engine.infer(&program(&[(0, "x")]), &ZeroLoss);
        assert_eq!(names(&result), vec!["ᐧ0"]);
    }
}
