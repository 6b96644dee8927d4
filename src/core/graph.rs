//! core::graph
//!
//! Undirected weighted graph kept alongside the store.
//!
//! # Architecture
//!
//! The graph is an adjacency list:
//! - Nodes are arbitrary strings
//! - Edges are undirected and carry an integer weight
//! - Neighbors are ordered by name, so traversals are deterministic
//!
//! The graph is not part of the key-value mapping. It is snapshotted into
//! every commit and restored on checkout by the owning
//! [`Workspace`](crate::workspace::Workspace).
//!
//! # Invariants
//!
//! - Every edge is stored in both directions with the same weight
//! - An edge to an existing neighbor keeps its first weight

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Adjacency-list graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyGraph {
    adjacency: BTreeMap<String, BTreeMap<String, i64>>,
}

impl AdjacencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no edges. Existing nodes are left alone.
    pub fn insert_node(&mut self, node: &str) {
        self.adjacency.entry(node.to_string()).or_default();
    }

    /// Add an undirected edge between `from` and `to`.
    ///
    /// Both endpoints are created if missing.
    pub fn insert_edge(&mut self, from: &str, to: &str, weight: i64) {
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_insert(weight);
        self.adjacency
            .entry(to.to_string())
            .or_default()
            .entry(from.to_string())
            .or_insert(weight);
    }

    /// Neighbors of `node` with edge weights, in name order.
    pub fn neighbors(&self, node: &str) -> impl Iterator<Item = (&str, i64)> {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(n, w)| (n.as_str(), *w)))
    }

    /// Check whether `node` exists.
    pub fn contains_node(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Breadth-first traversal from `start`.
    ///
    /// Neighbors are enqueued in name order. A start node that is not in the
    /// graph yields just itself.
    ///
    /// # Example
    ///
    /// ```
    /// use verdant::core::graph::AdjacencyGraph;
    ///
    /// let mut graph = AdjacencyGraph::new();
    /// graph.insert_edge("a", "c", 1);
    /// graph.insert_edge("a", "b", 1);
    /// graph.insert_edge("b", "d", 1);
    ///
    /// assert_eq!(graph.bfs("a"), vec!["a", "b", "c", "d"]);
    /// ```
    pub fn bfs(&self, start: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        visited.insert(start.to_string());
        queue.push_back(start.to_string());

        while let Some(node) = queue.pop_front() {
            for (next, _) in self.neighbors(&node) {
                if visited.insert(next.to_string()) {
                    queue.push_back(next.to_string());
                }
            }
            result.push(node);
        }

        result
    }

    /// Depth-first traversal from `start` using an explicit stack.
    ///
    /// Neighbors are pushed in name order, so the largest unvisited neighbor
    /// is explored first.
    ///
    /// # Example
    ///
    /// ```
    /// use verdant::core::graph::AdjacencyGraph;
    ///
    /// let mut graph = AdjacencyGraph::new();
    /// graph.insert_edge("a", "b", 1);
    /// graph.insert_edge("a", "c", 1);
    /// graph.insert_edge("b", "d", 1);
    ///
    /// assert_eq!(graph.dfs("a"), vec!["a", "c", "b", "d"]);
    /// ```
    pub fn dfs(&self, start: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![start.to_string()];

        while let Some(node) = stack.pop() {
            if !visited.insert(node.clone()) {
                continue;
            }
            stack.extend(self.neighbors(&node).map(|(next, _)| next.to_string()));
            result.push(node);
        }

        result
    }
}
