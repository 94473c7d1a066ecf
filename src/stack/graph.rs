//! Declaration Dependency Tracking
//!
//! Every reference a declaration or output holds becomes an edge from the
//! referenced construct to the referencing one. The graph backs:
//!
//! - Topological ordering (the order the external engine may create things)
//! - Cycle detection
//! - Impact analysis (what depends on a construct, directly or transitively)
//! - Dependency visualization (DOT)

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::error::{Error, Result};

/// A node in the declaration graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Construct id, or `output.<name>` for outputs
    pub id: String,
    /// Terraform resource type, or `output`
    pub node_type: String,
    /// Declaration sequence number
    pub sequence: u64,
}

/// An edge: `to` reads `attribute` of `from` through its field `field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Referenced construct
    pub from_id: String,
    /// Referencing construct
    pub to_id: String,
    /// Field on the referencing construct
    pub field: String,
    /// Attribute of the referenced construct
    pub attribute: String,
}

/// The dependency graph of a stack
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    node_indices: HashMap<String, NodeIndex>,
    sequence_counter: u64,
}

impl DeclarationGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns the existing index if the id is already present
    pub fn add_node(&mut self, id: impl Into<String>, node_type: impl Into<String>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.node_indices.get(&id) {
            return idx;
        }

        let node = GraphNode {
            id: id.clone(),
            node_type: node_type.into(),
            sequence: self.sequence_counter,
        };
        self.sequence_counter += 1;

        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }

    /// Add a dependency edge between two known nodes
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        let from_idx = *self
            .node_indices
            .get(&edge.from_id)
            .ok_or_else(|| Error::unresolved_reference(&edge.to_id, &edge.from_id))?;
        let to_idx = *self
            .node_indices
            .get(&edge.to_id)
            .ok_or_else(|| Error::unresolved_reference(&edge.from_id, &edge.to_id))?;

        self.graph.add_edge(from_idx, to_idx, edge);
        Ok(())
    }

    /// Check for dependency cycles
    pub fn has_cycles(&self) -> bool {
        tarjan_scc(&self.graph).iter().any(|scc| scc.len() > 1)
    }

    /// Topological order of node ids, ties broken by declaration order
    pub fn topological_order(&self) -> Result<Vec<String>> {
        if let Err(cycle) = toposort(&self.graph, None) {
            let id = self
                .graph
                .node_weight(cycle.node_id())
                .map(|n| n.id.clone())
                .unwrap_or_default();
            return Err(Error::DependencyCycle(id));
        }

        // Kahn's algorithm over a min-heap of sequence numbers
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.edges_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<(u64, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse((self.graph[*idx].sequence, *idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, idx))) = ready.pop() {
            order.push(self.graph[idx].id.clone());
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target();
                if let Some(degree) = in_degree.get_mut(&target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((self.graph[target].sequence, target)));
                    }
                }
            }
        }

        Ok(order)
    }

    /// Direct dependencies of a node (what it references)
    pub fn dependencies_of(&self, id: &str) -> Vec<String> {
        self.direct(id, Direction::Incoming)
    }

    /// Direct dependents of a node (what references it)
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        self.direct(id, Direction::Outgoing)
    }

    /// Every node that depends on `id`, directly or transitively
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(&start_idx) = self.node_indices.get(id) {
            queue.push_back(start_idx);

            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors_directed(current, Direction::Outgoing) {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        self.sorted_ids(seen)
    }

    /// Edges pointing into `id`
    pub fn incoming_edges(&self, id: &str) -> Vec<&GraphEdge> {
        match self.node_indices.get(id) {
            Some(&idx) => {
                let mut edges: Vec<&GraphEdge> = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| e.weight())
                    .collect();
                edges.reverse();
                edges
            }
            None => Vec::new(),
        }
    }

    /// Get a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Generate a DOT format representation for visualization
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph stack {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        let mut nodes: Vec<&GraphNode> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.sequence);
        for node in nodes {
            let shape = if node.node_type == "output" {
                "ellipse"
            } else {
                "box"
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{}\", shape={}];\n",
                node.id, node.id, node.node_type, shape
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            let dep = edge.weight();
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                dep.from_id, dep.to_id, dep.field
            ));
        }

        output.push_str("}\n");
        output
    }

    fn direct(&self, id: &str, direction: Direction) -> Vec<String> {
        let neighbors: HashSet<NodeIndex> = match self.node_indices.get(id) {
            Some(&idx) => self.graph.neighbors_directed(idx, direction).collect(),
            None => HashSet::new(),
        };
        self.sorted_ids(neighbors)
    }

    fn sorted_ids(&self, indices: HashSet<NodeIndex>) -> Vec<String> {
        let mut nodes: Vec<&GraphNode> = indices
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect();
        nodes.sort_by_key(|n| n.sequence);
        nodes.into_iter().map(|n| n.id.clone()).collect()
    }
}
