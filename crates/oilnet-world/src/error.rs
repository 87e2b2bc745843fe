//! Error types for the `oilnet-world` crate.
//!
//! Only graph construction can fail. Pathfinder queries between
//! disconnected nodes are not errors: they return `None`.

use oilnet_types::{EdgeId, NodeId, TransportMode};

/// Errors that can occur while building or looking up the transport graph.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A node was not found in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// An edge was not found in the graph.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A node with the same id already exists.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An edge with the same id already exists.
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    /// A second edge was declared between an already connected pair.
    #[error("edge {edge} duplicates {existing} between {a} and {b}")]
    ParallelEdge {
        /// The rejected edge.
        edge: EdgeId,
        /// The edge already joining the pair.
        existing: EdgeId,
        /// First endpoint.
        a: NodeId,
        /// Second endpoint.
        b: NodeId,
    },

    /// An edge starts and ends at the same node.
    #[error("edge {edge} loops on node {node}")]
    SelfLoop {
        /// The rejected edge.
        edge: EdgeId,
        /// The node.
        node: NodeId,
    },

    /// A node attribute that must be non-negative is negative.
    #[error("node {node} has negative {attribute}")]
    NegativeAttribute {
        /// The node.
        node: NodeId,
        /// Dotted attribute path, e.g. `production.capacity`.
        attribute: &'static str,
    },

    /// A transport mode on an edge declares a negative cost.
    #[error("edge {edge} has negative {mode:?} cost")]
    NegativeEdgeCost {
        /// The edge.
        edge: EdgeId,
        /// The offending mode.
        mode: TransportMode,
    },

    /// Pipelines are built by players and cannot be declared as a plain mode.
    #[error("edge {0} declares a pipeline as a plain transport mode")]
    PipelineAsPlainMode(EdgeId),
}
