//! ProgramGraph: the naming-constraint graph of one example program.
//!
//! Every variable occurrence is a vertex whose position in the node sequence
//! is its [`NodeId`]; literals are vertices of their own, added after all
//! variables and shared by every edge that mentions the same literal text.
//! Edges are resolved to vertex indices exactly once, at construction.
//!
//! The graph is immutable after ingestion. It stores the ground-truth labels
//! but no "current" names: every query that needs endpoint names takes a
//! label slice (the ground truth or a working hypothesis) and reads variable
//! names through it. Relabeling a hypothesis therefore relabels every edge
//! that touches the node, without copying or rewriting the graph.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::error::IngestError;
use crate::feature::FeatureKeyRef;
use crate::id::{NodeId, ScopeId};
use crate::label::{check_identifier, Label};

/// The two edge shapes of the input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Variable to variable.
    #[serde(rename = "var-var")]
    VarVar,
    /// Variable to a fixed literal or token.
    #[serde(rename = "var-lit")]
    VarLit,
}

impl EdgeKind {
    /// The wire spelling used in corpus documents.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::VarVar => "var-var",
            EdgeKind::VarLit => "var-lit",
        }
    }

    /// Parses the wire spelling.
    pub fn parse(text: &str) -> Option<EdgeKind> {
        match text {
            "var-var" => Some(EdgeKind::VarVar),
            "var-lit" => Some(EdgeKind::VarLit),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex of the naming graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vertex {
    /// A variable occurrence. Its name lives in whichever label slice is
    /// being evaluated, never in the graph.
    Variable { scope: ScopeId },
    /// A fixed literal or token. Never relabeled.
    Literal(String),
}

/// Edge payload: the relation label and the edge's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: EdgeKind,
    pub sequence: String,
}

/// Edge record as it appears in a corpus document.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawEdge {
    #[serde(rename = "var-var", rename_all = "camelCase")]
    VarVar {
        x_name: String,
        x_scope_id: u32,
        y_name: String,
        y_scope_id: u32,
        sequence: String,
    },
    #[serde(rename = "var-lit", rename_all = "camelCase")]
    VarLit {
        x_name: String,
        x_scope_id: u32,
        y_name: String,
        sequence: String,
    },
}

/// One training or inference example.
#[derive(Debug, Clone)]
pub struct ProgramGraph {
    /// Directed `x -> y`: the source is always the left side of a feature key.
    graph: DiGraph<Vertex, Relation, u32>,
    /// Ground-truth labels, positionally aligned with the variable vertices.
    truth: Vec<Label>,
    /// `(scope, name)` resolution index, built once. First occurrence wins.
    lookup: HashMap<Label, NodeId>,
    /// Literal text to its shared vertex.
    literals: HashMap<String, NodeIndex<u32>>,
    /// Edges touching each variable, in insertion order. Self-loops once.
    incidence: Vec<SmallVec<[EdgeIndex<u32>; 4]>>,
}

impl ProgramGraph {
    /// Creates a graph with one variable vertex per ground-truth label and no
    /// edges.
    pub fn new(truth: Vec<Label>) -> Self {
        let mut graph = DiGraph::with_capacity(truth.len(), 0);
        let mut lookup = HashMap::with_capacity(truth.len());
        for (position, label) in truth.iter().enumerate() {
            graph.add_node(Vertex::Variable { scope: label.scope });
            lookup
                .entry(label.clone())
                .or_insert(NodeId(position as u32));
        }
        let incidence = vec![SmallVec::new(); truth.len()];
        ProgramGraph {
            graph,
            truth,
            lookup,
            literals: HashMap::new(),
            incidence,
        }
    }

    /// Parses and validates one corpus document.
    pub fn from_json(text: &str) -> Result<Self, IngestError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Builds a graph from an already-parsed corpus document.
    ///
    /// Edges are added in document order. Any structural problem (missing
    /// fields, unknown edge type, unresolved endpoint, reserved divider in
    /// text) rejects the whole document.
    pub fn from_value(value: &Value) -> Result<Self, IngestError> {
        let Value::Object(map) = value else {
            return Err(IngestError::NotAnObject);
        };

        let names = map.get("y_names").ok_or(IngestError::MissingNodes)?;
        let names = Vec::<String>::deserialize(names)
            .map_err(|source| IngestError::MalformedNodes { source })?;
        let truth = names
            .iter()
            .map(|text| {
                let label = Label::parse(text)?;
                check_identifier(&label.name)?;
                Ok(label)
            })
            .collect::<Result<Vec<_>, IngestError>>()?;

        let mut program = ProgramGraph::new(truth);
        for (key, record) in map {
            if key == "y_names" {
                continue;
            }
            let raw = RawEdge::deserialize(record).map_err(|source| IngestError::MalformedEdge {
                edge: key.clone(),
                source,
            })?;
            program.add_raw_edge(key, raw)?;
        }
        Ok(program)
    }

    fn add_raw_edge(&mut self, key: &str, raw: RawEdge) -> Result<EdgeIndex<u32>, IngestError> {
        match raw {
            RawEdge::VarVar {
                x_name,
                x_scope_id,
                y_name,
                y_scope_id,
                sequence,
            } => {
                check_identifier(&x_name)?;
                check_identifier(&y_name)?;
                check_identifier(&sequence)?;
                let x = self.resolve_endpoint(key, Label::new(ScopeId(x_scope_id), x_name))?;
                let y = self.resolve_endpoint(key, Label::new(ScopeId(y_scope_id), y_name))?;
                Ok(self.connect_variables(x, y, sequence))
            }
            RawEdge::VarLit {
                x_name,
                x_scope_id,
                y_name,
                sequence,
            } => {
                check_identifier(&x_name)?;
                check_identifier(&y_name)?;
                check_identifier(&sequence)?;
                let x = self.resolve_endpoint(key, Label::new(ScopeId(x_scope_id), x_name))?;
                Ok(self.connect_literal(x, y_name, sequence))
            }
        }
    }

    fn resolve_endpoint(&self, edge: &str, label: Label) -> Result<NodeId, IngestError> {
        self.resolve(&label)
            .ok_or_else(|| IngestError::UnresolvedEndpoint {
                edge: edge.to_string(),
                label,
            })
    }

    /// Adds a `var-var` edge between two ground-truth labels.
    pub fn add_var_var(
        &mut self,
        x: &Label,
        y: &Label,
        relation: &str,
    ) -> Result<EdgeIndex<u32>, IngestError> {
        let edge = format!("#{}", self.graph.edge_count());
        check_identifier(relation)?;
        let x = self.resolve_endpoint(&edge, x.clone())?;
        let y = self.resolve_endpoint(&edge, y.clone())?;
        Ok(self.connect_variables(x, y, relation.to_string()))
    }

    /// Adds a `var-lit` edge from a ground-truth label to a literal.
    pub fn add_var_lit(
        &mut self,
        x: &Label,
        literal: &str,
        relation: &str,
    ) -> Result<EdgeIndex<u32>, IngestError> {
        let edge = format!("#{}", self.graph.edge_count());
        check_identifier(literal)?;
        check_identifier(relation)?;
        let x = self.resolve_endpoint(&edge, x.clone())?;
        Ok(self.connect_literal(x, literal.to_string(), relation.to_string()))
    }

    fn connect_variables(&mut self, x: NodeId, y: NodeId, sequence: String) -> EdgeIndex<u32> {
        let relation = Relation {
            kind: EdgeKind::VarVar,
            sequence,
        };
        let edge = self.graph.add_edge(x.into(), y.into(), relation);
        self.incidence[x.index()].push(edge);
        if x != y {
            self.incidence[y.index()].push(edge);
        }
        edge
    }

    fn connect_literal(&mut self, x: NodeId, literal: String, sequence: String) -> EdgeIndex<u32> {
        let target = match self.literals.get(&literal) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(Vertex::Literal(literal.clone()));
                self.literals.insert(literal, idx);
                idx
            }
        };
        let relation = Relation {
            kind: EdgeKind::VarLit,
            sequence,
        };
        let edge = self.graph.add_edge(x.into(), target, relation);
        self.incidence[x.index()].push(edge);
        edge
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Number of variable occurrences (the length of every assignment).
    pub fn node_count(&self) -> usize {
        self.truth.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Variable nodes in node-sequence order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.truth.len() as u32).map(NodeId)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex<u32>> {
        self.graph.edge_indices()
    }

    /// Ground-truth labels, positionally aligned with [`nodes`](Self::nodes).
    pub fn truth(&self) -> &[Label] {
        &self.truth
    }

    /// Resolves a ground-truth label to its node.
    pub fn resolve(&self, label: &Label) -> Option<NodeId> {
        self.lookup.get(label).copied()
    }

    /// Edges touching `node`, whether it is the `x` or `y` side.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeIndex<u32>] {
        &self.incidence[node.index()]
    }

    /// The relation carried by an edge.
    pub fn relation(&self, edge: EdgeIndex<u32>) -> &Relation {
        &self.graph.raw_edges()[edge.index()].weight
    }

    /// Name of a vertex under `labels`: variables read their label, literals
    /// their own text.
    fn vertex_name<'a>(&'a self, vertex: NodeIndex<u32>, labels: &'a [Label]) -> &'a str {
        match &self.graph[vertex] {
            Vertex::Variable { .. } => &labels[vertex.index()].name,
            Vertex::Literal(text) => text,
        }
    }

    /// The feature key an edge forms when nodes carry `labels`.
    pub fn feature_key<'a>(
        &'a self,
        edge: EdgeIndex<u32>,
        labels: &'a [Label],
    ) -> FeatureKeyRef<'a> {
        let raw = &self.graph.raw_edges()[edge.index()];
        FeatureKeyRef {
            left: self.vertex_name(raw.source(), labels),
            relation: &raw.weight.sequence,
            right: self.vertex_name(raw.target(), labels),
        }
    }

    /// The name at the far end of `edge` as seen from `node`, under `labels`.
    ///
    /// Together with the relation this forms the node signature used to look
    /// up candidate names. A self-loop's far end is the node itself.
    pub fn anchor<'a>(
        &'a self,
        edge: EdgeIndex<u32>,
        node: NodeId,
        labels: &'a [Label],
    ) -> &'a str {
        let raw = &self.graph.raw_edges()[edge.index()];
        let here: NodeIndex<u32> = node.into();
        let far = if raw.source() == here {
            raw.target()
        } else {
            raw.source()
        };
        self.vertex_name(far, labels)
    }
}
