//! Graph model: nodes with economic roles, undirected multi-modal edges.
//!
//! The [`GraphModel`] is the spatial backbone of the economy. The map
//! generator creates it once; afterwards nodes and edges are only augmented
//! (ownership, fees, upgrades) and never removed, so ids stay stable for the
//! whole game.
//!
//! An adjacency index maps each node to the edges touching it. At most one
//! edge may join any pair of nodes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use oilnet_types::{Edge, EdgeId, Node, NodeId, NodeRole};
use rust_decimal::Decimal;

use crate::edge;
use crate::error::WorldError;

/// The transport graph holding every node and edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphModel {
    /// All nodes indexed by id.
    nodes: BTreeMap<NodeId, Node>,
    /// All edges indexed by id.
    edges: BTreeMap<EdgeId, Edge>,
    /// Node -> ids of the edges touching it.
    adjacency: BTreeMap<NodeId, Vec<EdgeId>>,
}

impl GraphModel {
    /// Create an empty graph.
    pub const fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
        }
    }

    /// Build a graph from generator output, validating every node and edge.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorldError`] raised by [`add_node`] or
    /// [`add_edge`].
    ///
    /// [`add_node`]: GraphModel::add_node
    /// [`add_edge`]: GraphModel::add_edge
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, WorldError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    // -------------------------------------------------------------------
    // Node operations
    // -------------------------------------------------------------------

    /// Add a node to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateNode`] if the id is taken, or
    /// [`WorldError::NegativeAttribute`] if a capacity or cost is negative.
    pub fn add_node(&mut self, node: Node) -> Result<(), WorldError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(WorldError::DuplicateNode(id));
        }
        if let Some(attribute) = node.first_negative_attribute() {
            return Err(WorldError::NegativeAttribute {
                node: id,
                attribute,
            });
        }
        self.nodes.insert(id, node);
        self.adjacency.entry(id).or_default();
        Ok(())
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Iterate over nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over nodes mutably in id order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Ids of the nodes holding `role`, ascending.
    pub fn nodes_with_role(&self, role: NodeRole) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.has_role(role))
            .map(|n| n.id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Edge operations
    // -------------------------------------------------------------------

    /// Add an undirected edge.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`] for a missing endpoint,
    /// [`WorldError::SelfLoop`], [`WorldError::DuplicateEdge`],
    /// [`WorldError::ParallelEdge`] if the pair is already joined, or a
    /// cost validation error from [`edge::validate`].
    pub fn add_edge(&mut self, new_edge: Edge) -> Result<(), WorldError> {
        if !self.nodes.contains_key(&new_edge.a) {
            return Err(WorldError::NodeNotFound(new_edge.a));
        }
        if !self.nodes.contains_key(&new_edge.b) {
            return Err(WorldError::NodeNotFound(new_edge.b));
        }
        if new_edge.a == new_edge.b {
            return Err(WorldError::SelfLoop {
                edge: new_edge.id,
                node: new_edge.a,
            });
        }
        if self.edges.contains_key(&new_edge.id) {
            return Err(WorldError::DuplicateEdge(new_edge.id));
        }
        if let Some(existing) = self.edge_between(new_edge.a, new_edge.b) {
            return Err(WorldError::ParallelEdge {
                edge: new_edge.id,
                existing: existing.id,
                a: new_edge.a,
                b: new_edge.b,
            });
        }
        edge::validate(&new_edge)?;

        let id = new_edge.id;
        self.adjacency.entry(new_edge.a).or_default().push(id);
        self.adjacency.entry(new_edge.b).or_default().push(id);
        self.edges.insert(id, new_edge);
        Ok(())
    }

    /// Get an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Get an edge mutably.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    // -------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------

    /// The edge joining `a` and `b`, in either direction.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.adjacency
            .get(&a)?
            .iter()
            .filter_map(|id| self.edges.get(id))
            .find(|e| e.connects(a, b))
    }

    /// Neighbours of `node` together with the joining edge ids.
    pub fn neighbors(&self, node: NodeId) -> Vec<(NodeId, EdgeId)> {
        let Some(edge_ids) = self.adjacency.get(&node) else {
            return Vec::new();
        };
        edge_ids
            .iter()
            .filter_map(|id| self.edges.get(id))
            .filter_map(|e| e.other_end(node).map(|other| (other, e.id)))
            .collect()
    }

    /// Whether every node can reach every other node over usable edges.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.nodes.keys().next() else {
            return true;
        };
        self.component_of(start).len() == self.nodes.len()
    }

    /// Every node reachable from `start` over usable edges, including `start`.
    pub fn component_of(&self, start: NodeId) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        if !self.nodes.contains_key(&start) {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for (neighbor, edge_id) in self.neighbors(current) {
                let usable = self
                    .edges
                    .get(&edge_id)
                    .and_then(edge::effective_cost)
                    .is_some();
                if usable && visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited
    }

    // -------------------------------------------------------------------
    // Turn operations
    // -------------------------------------------------------------------

    /// Zero every per-turn counter on nodes and edges.
    ///
    /// Topology, ownership, fees, and base demand are left untouched.
    pub fn reset_turn_counters(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(p) = node.production.as_mut() {
                p.extracted = Decimal::ZERO;
            }
            if let Some(r) = node.processing.as_mut() {
                r.throughput = Decimal::ZERO;
            }
            if let Some(c) = node.consumption.as_mut() {
                c.served = Decimal::ZERO;
                c.imported = Decimal::ZERO;
            }
        }
        for e in self.edges.values_mut() {
            e.flow = Decimal::ZERO;
            if let Some(p) = e.pipeline.as_mut() {
                p.flow = Decimal::ZERO;
            }
        }
    }
}
