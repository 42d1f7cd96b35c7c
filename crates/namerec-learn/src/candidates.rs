//! Weight-ranked candidate names per node signature.
//!
//! A node signature is the `(anchor, relation)` pair seen from one end of an
//! edge: the name at the far end plus the relation label. Each signature maps
//! to the names that some feature key pairs with it, ranked by the current
//! weight of that key, highest first.
//!
//! The entry lists are a pure function of the [`FeatureIndex`]; only their
//! order depends on the weights. Ties fall back to feature-index order, so a
//! re-rank produces exactly what a fresh build over the same weights would.

use std::cmp::Ordering;

use indexmap::{Equivalent, IndexMap};

use namerec_core::{EdgeKind, FeatureId, FeatureIndex};

/// One ranked proposal: the feature that supports it and the name it puts on
/// the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub feature: FeatureId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    anchor: String,
    relation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SignatureRef<'a> {
    anchor: &'a str,
    relation: &'a str,
}

impl Equivalent<Signature> for SignatureRef<'_> {
    fn equivalent(&self, key: &Signature) -> bool {
        self.anchor == key.anchor && self.relation == key.relation
    }
}

/// Signature to ranked candidates.
///
/// Constructed and re-ranked only by [`Model`](crate::Model), which owns the
/// weights the ranking must reflect.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    entries: IndexMap<Signature, Vec<Candidate>>,
}

impl CandidateIndex {
    /// Builds the index from every feature key and ranks it by `weights`.
    ///
    /// A `var-var` key `(l, r, rt)` proposes `rt` next to `l` and `l` next to
    /// `rt`. A `var-lit` key `(v, r, lit)` proposes `v` next to `lit` only,
    /// since a literal is never renamed.
    pub(crate) fn build(features: &FeatureIndex, weights: &[f64]) -> Self {
        let mut entries: IndexMap<Signature, Vec<Candidate>> = IndexMap::new();
        let mut push = |anchor: &str, relation: &str, feature: FeatureId, name: &str| {
            entries
                .entry(Signature {
                    anchor: anchor.to_string(),
                    relation: relation.to_string(),
                })
                .or_default()
                .push(Candidate {
                    feature,
                    name: name.to_string(),
                });
        };

        for (id, key, kind) in features.iter() {
            if kind == EdgeKind::VarVar {
                push(&key.left, &key.relation, id, &key.right);
            }
            push(&key.right, &key.relation, id, &key.left);
        }

        let mut index = CandidateIndex { entries };
        index.rerank(weights);
        index
    }

    /// Re-sorts every entry by `weights`, descending.
    pub(crate) fn rerank(&mut self, weights: &[f64]) {
        for ranked in self.entries.values_mut() {
            ranked.sort_by(|a, b| by_weight(weights, a, b));
        }
    }

    /// Full ranking for a signature; empty if the signature never occurred.
    pub fn ranked(&self, anchor: &str, relation: &str) -> &[Candidate] {
        self.entries
            .get(&SignatureRef { anchor, relation })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The `k` best candidates for a signature.
    pub fn top(&self, anchor: &str, relation: &str, k: usize) -> &[Candidate] {
        let ranked = self.ranked(anchor, relation);
        &ranked[..ranked.len().min(k)]
    }

    /// Number of distinct signatures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn by_weight(weights: &[f64], a: &Candidate, b: &Candidate) -> Ordering {
    weights[b.feature.index()]
        .total_cmp(&weights[a.feature.index()])
        .then(a.feature.cmp(&b.feature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use namerec_core::FeatureKey;

    fn features() -> FeatureIndex {
        let mut index = FeatureIndex::new();
        index.insert(FeatureKey::new("a", "call", "b"), EdgeKind::VarVar);
        index.insert(FeatureKey::new("a", "call", "c"), EdgeKind::VarVar);
        index.insert(FeatureKey::new("el", "arg", "document"), EdgeKind::VarLit);
        index
    }

    fn names(ranked: &[Candidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn var_var_keys_propose_both_directions() {
        let index = CandidateIndex::build(&features(), &[0.1, 0.2, 0.3]);
        assert_eq!(names(index.ranked("a", "call")), vec!["c", "b"]);
        assert_eq!(names(index.ranked("b", "call")), vec!["a"]);
        assert_eq!(names(index.ranked("c", "call")), vec!["a"]);
    }

    #[test]
    fn var_lit_keys_propose_only_the_variable_side() {
        let index = CandidateIndex::build(&features(), &[0.1, 0.2, 0.3]);
        assert_eq!(names(index.ranked("document", "arg")), vec!["el"]);
        assert!(index.ranked("el", "arg").is_empty());
    }

    #[test]
    fn rerank_follows_new_weights() {
        let mut index = CandidateIndex::build(&features(), &[0.1, 0.2, 0.3]);
        index.rerank(&[0.4, 0.0, 0.3]);
        assert_eq!(names(index.ranked("a", "call")), vec!["b", "c"]);
    }

    #[test]
    fn ties_keep_feature_order() {
        let mut index = CandidateIndex::build(&features(), &[0.5, 0.5, 0.5]);
        assert_eq!(names(index.ranked("a", "call")), vec!["b", "c"]);
        // Re-ranking from a different prior order still lands on index order.
        index.rerank(&[0.0, 1.0, 0.0]);
        index.rerank(&[0.5, 0.5, 0.5]);
        assert_eq!(names(index.ranked("a", "call")), vec!["b", "c"]);
    }

    #[test]
    fn top_truncates() {
        let index = CandidateIndex::build(&features(), &[0.1, 0.2, 0.3]);
        assert_eq!(names(index.top("a", "call", 1)), vec!["c"]);
        assert_eq!(index.top("a", "call", 10).len(), 2);
        assert!(index.top("missing", "call", 3).is_empty());
    }

    #[test]
    fn counts_signatures() {
        let index = CandidateIndex::build(&features(), &[0.0; 3]);
        // (a,call) (b,call) (c,call) (document,arg)
        assert_eq!(index.len(), 4);
    }
}
