//! Insertion-ordered graph container

use crate::model::*;
use serde::{Deserialize, Serialize};

/// A decoded graph.
///
/// Nodes and edges keep the order in which they appeared in the input;
/// every consumer iterates in that order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from already collected nodes and edges.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Graph { nodes, edges }
    }

    /// Append a node.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Append an edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Nodes in input order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in input order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether any edge leads from `from` to `to`, honoring direction.
    ///
    /// Linear in the number of edges; no index is kept.
    pub fn is_adjacent(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(from, to))
    }
}
