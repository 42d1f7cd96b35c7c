//! Feature keys and the dense [`FeatureIndex`].
//!
//! A feature is one `(left, relation, right)` name triple observed on an edge
//! of the training corpus. The index assigns each distinct key a dense
//! [`FeatureId`] in first-seen order; that id is the key's slot in every
//! weight vector trained against the index, so ids never move once assigned.
//!
//! Lookups during scoring go through [`FeatureKeyRef`], a borrowed view that
//! hashes identically to the owned key, so the hot path never allocates.

use std::fmt;

use indexmap::{Equivalent, IndexMap};
use serde::{Deserialize, Serialize};

use crate::id::FeatureId;
use crate::label::DIVIDER;
use crate::program::{EdgeKind, ProgramGraph};

/// An owned `(left, relation, right)` feature key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub left: String,
    pub relation: String,
    pub right: String,
}

/// A borrowed feature key. Field order and types mirror [`FeatureKey`] so the
/// derived `Hash` impls agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureKeyRef<'a> {
    pub left: &'a str,
    pub relation: &'a str,
    pub right: &'a str,
}

impl FeatureKey {
    pub fn new(
        left: impl Into<String>,
        relation: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        FeatureKey {
            left: left.into(),
            relation: relation.into(),
            right: right.into(),
        }
    }

    pub fn borrowed(&self) -> FeatureKeyRef<'_> {
        FeatureKeyRef {
            left: &self.left,
            relation: &self.relation,
            right: &self.right,
        }
    }
}

impl<'a> FeatureKeyRef<'a> {
    pub fn new(left: &'a str, relation: &'a str, right: &'a str) -> Self {
        FeatureKeyRef {
            left,
            relation,
            right,
        }
    }

    pub fn to_owned_key(&self) -> FeatureKey {
        FeatureKey::new(self.left, self.relation, self.right)
    }
}

impl Equivalent<FeatureKey> for FeatureKeyRef<'_> {
    fn equivalent(&self, key: &FeatureKey) -> bool {
        self.left == key.left && self.relation == key.relation && self.right == key.right
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.left,
            self.relation,
            self.right,
            d = DIVIDER
        )
    }
}

/// Immutable-after-ingestion mapping from feature key to dense index.
///
/// Each key also remembers the [`EdgeKind`] of the edge that first produced
/// it: a `var-var` key can propose a name for either endpoint, a `var-lit`
/// key only for its variable side.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    keys: IndexMap<FeatureKey, EdgeKind>,
}

// `IndexMap` equality ignores order; ids are positions, so order matters here.
impl PartialEq for FeatureIndex {
    fn eq(&self, other: &Self) -> bool {
        self.keys.len() == other.keys.len() && self.keys.iter().eq(other.keys.iter())
    }
}

impl FeatureIndex {
    pub fn new() -> Self {
        FeatureIndex::default()
    }

    /// Number of distinct feature keys (the weight-vector dimension).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Looks up the dense index of a key. Unknown keys return `None`.
    pub fn get(&self, key: &FeatureKeyRef<'_>) -> Option<FeatureId> {
        self.keys
            .get_index_of(key)
            .map(|position| FeatureId(position as u32))
    }

    /// Iterates keys in index order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &FeatureKey, EdgeKind)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(position, (key, kind))| (FeatureId(position as u32), key, *kind))
    }

    /// Inserts a key, returning its id. An existing key keeps its id and the
    /// kind it was first registered with.
    pub fn insert(&mut self, key: FeatureKey, kind: EdgeKind) -> FeatureId {
        let entry = self.keys.entry(key);
        let position = entry.index();
        entry.or_insert(kind);
        FeatureId(position as u32)
    }

    /// Registers every edge key a program produces under its ground-truth
    /// labels. Returns how many keys were new.
    pub fn register_program(&mut self, program: &ProgramGraph) -> usize {
        let before = self.keys.len();
        let truth = program.truth();
        for edge in program.edges() {
            let key = program.feature_key(edge, truth);
            if self.get(&key).is_none() {
                self.insert(key.to_owned_key(), program.relation(edge).kind);
            }
        }
        self.keys.len() - before
    }
}
