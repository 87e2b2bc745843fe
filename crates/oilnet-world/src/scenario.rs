//! Serializable map description loaded from scenario files.

use oilnet_types::{Edge, Node};

use crate::error::WorldError;
use crate::graph::GraphModel;

/// A map as written in a scenario file: plain node and edge lists.
///
/// Unlike [`GraphModel`] a scenario is not validated on load; call
/// [`Scenario::into_graph`] to check invariants and build the adjacency
/// index.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    /// Nodes in id order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Undirected edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Scenario {
    /// Validate the scenario and turn it into a graph.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] for the first node or edge that breaks a
    /// graph invariant.
    pub fn into_graph(self) -> Result<GraphModel, WorldError> {
        GraphModel::from_parts(self.nodes, self.edges)
    }

    /// Capture an existing graph as a scenario.
    pub fn from_graph(graph: &GraphModel) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
        }
    }
}
