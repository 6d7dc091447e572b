//! Core data structures for decoded graphs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node as written in the source document.
///
/// Identifiers are unique within a graph but carry no ordering or
/// contiguity guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId(value)
    }
}

/// A single vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Node {
    pub id: NodeId,
    /// Arbitrary weight, zero when the document does not specify one.
    pub cost: f64,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, cost: f64) -> Self {
        Node { id: id.into(), cost }
    }
}

/// A connection between two node identifiers.
///
/// Endpoints are not checked against the graph's nodes; a dangling
/// endpoint simply never matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub cost: f64,
    /// Directed edges only connect `source` to `target`.
    pub directed: bool,
}

impl Edge {
    /// Undirected edge with the given cost.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, cost: f64) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            cost,
            directed: false,
        }
    }

    /// Directed edge with the given cost.
    pub fn directed(source: impl Into<NodeId>, target: impl Into<NodeId>, cost: f64) -> Self {
        Edge {
            directed: true,
            ..Edge::new(source, target, cost)
        }
    }

    /// Whether this edge leads from `from` to `to`.
    pub fn connects(&self, from: NodeId, to: NodeId) -> bool {
        (self.source == from && self.target == to)
            || (!self.directed && self.source == to && self.target == from)
    }
}
