//! Working label hypotheses and the placeholder generator that seeds them.

use std::collections::HashMap;

use crate::id::{NodeId, ScopeId};
use crate::label::{Label, DIVIDER};

/// Generator of placeholder names for the initial hypothesis.
///
/// Tokens are `<DIVIDER><n>` for increasing `n`. Because the divider never
/// occurs in identifier text, a token can never collide with a real name or
/// with any other token from the same generator.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTokens {
    next: u64,
}

impl PlaceholderTokens {
    pub fn new() -> Self {
        PlaceholderTokens::default()
    }

    /// Starts the sequence at `seed` instead of zero.
    pub fn starting_at(seed: u64) -> Self {
        PlaceholderTokens { next: seed }
    }

    /// The token `index` positions into a sequence started at zero.
    pub fn token(index: u64) -> String {
        format!("{}{}", DIVIDER, index)
    }
}

impl Iterator for PlaceholderTokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let token = Self::token(self.next);
        self.next += 1;
        Some(token)
    }
}

/// One label per node, in node order, plus a per-scope occupancy count that
/// backs the duplicate-name check.
///
/// Scopes are fixed at construction; [`relabel`](Self::relabel) only changes
/// names and keeps the occupancy index in step with the labels.
#[derive(Debug, Clone)]
pub struct Assignment {
    labels: Vec<Label>,
    occupancy: HashMap<ScopeId, HashMap<String, u32>>,
}

impl Assignment {
    pub fn new(labels: Vec<Label>) -> Self {
        let mut occupancy: HashMap<ScopeId, HashMap<String, u32>> = HashMap::new();
        for label in &labels {
            *occupancy
                .entry(label.scope)
                .or_default()
                .entry(label.name.clone())
                .or_insert(0) += 1;
        }
        Assignment { labels, occupancy }
    }

    /// A hypothesis that keeps every scope of `truth` and gives each node a
    /// fresh token from `tokens`.
    pub fn placeholders(truth: &[Label], tokens: &mut PlaceholderTokens) -> Self {
        let labels = truth
            .iter()
            .zip(tokens)
            .map(|(label, token)| Label::new(label.scope, token))
            .collect();
        Assignment::new(labels)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, node: NodeId) -> &Label {
        &self.labels[node.index()]
    }

    /// Returns `true` iff some node other than `node` currently holds `name`
    /// in `node`'s scope.
    pub fn is_taken(&self, node: NodeId, name: &str) -> bool {
        let label = &self.labels[node.index()];
        let held = self
            .occupancy
            .get(&label.scope)
            .and_then(|names| names.get(name))
            .copied()
            .unwrap_or(0);
        let own = u32::from(label.name == name);
        held > own
    }

    /// Renames `node` in place, returning its previous name.
    pub fn relabel(&mut self, node: NodeId, name: String) -> String {
        let scope = self.labels[node.index()].scope;
        let previous = std::mem::replace(&mut self.labels[node.index()].name, name);
        let names = self.occupancy.entry(scope).or_default();
        if let Some(count) = names.get_mut(&previous) {
            *count -= 1;
            if *count == 0 {
                names.remove(&previous);
            }
        }
        *names
            .entry(self.labels[node.index()].name.clone())
            .or_insert(0) += 1;
        previous
    }
}

impl PartialEq for Assignment {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Assignment {}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(scope: u32, name: &str) -> Label {
        Label::new(ScopeId(scope), name)
    }

    #[test]
    fn tokens_are_distinct_and_monotone() {
        let tokens: Vec<String> = PlaceholderTokens::new().take(3).collect();
        assert_eq!(tokens, vec!["ᐧ0", "ᐧ1", "ᐧ2"]);
    }

    #[test]
    fn seeded_tokens_start_at_seed() {
        let first = PlaceholderTokens::starting_at(40).next().unwrap();
        assert_eq!(first, PlaceholderTokens::token(40));
    }

    #[test]
    fn placeholders_keep_scopes() {
        let truth = vec![label(0, "a"), label(3, "b")];
        let hypothesis = Assignment::placeholders(&truth, &mut PlaceholderTokens::new());
        assert_eq!(hypothesis.len(), 2);
        assert_eq!(hypothesis.get(NodeId(1)).scope, ScopeId(3));
        assert!(hypothesis
            .labels()
            .iter()
            .all(|label| label.name.starts_with(DIVIDER)));
    }

    #[test]
    fn is_taken_ignores_the_node_itself() {
        let assignment = Assignment::new(vec![label(0, "a"), label(0, "b"), label(1, "c")]);
        assert!(!assignment.is_taken(NodeId(0), "a"));
        assert!(assignment.is_taken(NodeId(0), "b"));
        // Same name in another scope does not collide.
        assert!(!assignment.is_taken(NodeId(0), "c"));
        assert!(!assignment.is_taken(NodeId(2), "a"));
    }

    #[test]
    fn relabel_moves_occupancy() {
        let mut assignment = Assignment::new(vec![label(0, "a"), label(0, "b")]);
        let previous = assignment.relabel(NodeId(1), "z".to_string());
        assert_eq!(previous, "b");
        assert!(!assignment.is_taken(NodeId(0), "b"));
        assert!(assignment.is_taken(NodeId(0), "z"));
        assert_eq!(assignment.get(NodeId(1)), &label(0, "z"));
    }

    #[test]
    fn relabel_and_revert_restores_state() {
        let original = Assignment::new(vec![label(0, "a"), label(0, "b")]);
        let mut working = original.clone();
        let previous = working.relabel(NodeId(0), "q".to_string());
        working.relabel(NodeId(0), previous);
        assert_eq!(working, original);
        assert!(working.is_taken(NodeId(1), "a"));
        assert!(!working.is_taken(NodeId(1), "q"));
    }

    #[test]
    fn duplicate_holders_are_counted() {
        let mut assignment = Assignment::new(vec![label(0, "x"), label(0, "x"), label(0, "y")]);
        assert!(assignment.is_taken(NodeId(0), "x"));
        assignment.relabel(NodeId(1), "w".to_string());
        assert!(!assignment.is_taken(NodeId(0), "x"));
        assert!(assignment.is_taken(NodeId(2), "x"));
    }
}
