//! All-pairs shortest-cost routing over the transport graph.
//!
//! The [`Pathfinder`] owns a distance matrix and a next-hop matrix computed
//! with a Floyd-Warshall relaxation. Each edge contributes a single weight,
//! the cheapest usable mode from [`edge::effective_cost`].
//!
//! # Rebuild contract
//!
//! Matrices are rebuilt in full, never patched. Callers must call
//! [`Pathfinder::rebuild`] after any change to topology, mode availability,
//! or pipeline fees; queries made in between answer for the old graph.
//!
//! Rebuild is `O(n^3)` in the node count, which is fine for maps of a few
//! hundred nodes. Larger maps need repeated Dijkstra over the sparse graph.
//!
//! Unreachable pairs are not errors: cost and path queries return `None`.

use std::collections::BTreeMap;

use oilnet_types::{EdgeId, NodeId, PlayerId, TransportMode};
use rust_decimal::Decimal;
use tracing::debug;

use crate::edge;
use crate::graph::GraphModel;

/// The direct link the pathfinder chose between two adjacent nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    edge: EdgeId,
    mode: TransportMode,
    cost: Decimal,
    pipeline_owner: Option<PlayerId>,
}

/// One hop of a [`DetailedRoute`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RouteSegment {
    /// Edge traversed.
    pub edge: EdgeId,
    /// Node the hop leaves from.
    pub from: NodeId,
    /// Node the hop arrives at.
    pub to: NodeId,
    /// Mode used on the edge.
    pub mode: TransportMode,
    /// Per-barrel cost of the hop.
    pub cost: Decimal,
    /// Owner to pay when the hop rides a pipeline.
    pub pipeline_owner: Option<PlayerId>,
}

/// A shortest path decomposed into the edges and modes it uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DetailedRoute {
    /// Hops in travel order. Empty when origin and destination coincide.
    pub segments: Vec<RouteSegment>,
    /// Sum of the segment costs.
    pub total_cost: Decimal,
}

impl DetailedRoute {
    /// Segments riding a pipeline, i.e. the ones that earn an owner a fee.
    pub fn pipeline_segments(&self) -> impl Iterator<Item = &RouteSegment> {
        self.segments
            .iter()
            .filter(|s| s.mode == TransportMode::Pipeline)
    }
}

/// Distance and next-hop matrices over the last graph it was rebuilt from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pathfinder {
    /// Matrix index -> node id, ascending.
    ids: Vec<NodeId>,
    /// Node id -> matrix index.
    index: BTreeMap<NodeId, usize>,
    /// Row-major `n * n` cheapest cost, `None` when unreachable.
    dist: Vec<Option<Decimal>>,
    /// Row-major `n * n` index of the first hop from row towards column.
    next: Vec<Option<usize>>,
    /// Chosen direct link for each adjacent ordered pair.
    links: BTreeMap<(usize, usize), Link>,
}

impl Pathfinder {
    /// Create an empty pathfinder that knows no nodes.
    pub const fn new() -> Self {
        Self {
            ids: Vec::new(),
            index: BTreeMap::new(),
            dist: Vec::new(),
            next: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    /// Create a pathfinder already rebuilt from `graph`.
    pub fn from_graph(graph: &GraphModel) -> Self {
        let mut pathfinder = Self::new();
        pathfinder.rebuild(graph);
        pathfinder
    }

    /// Number of nodes covered by the matrices.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Recompute every pairwise cheapest cost from scratch.
    pub fn rebuild(&mut self, graph: &GraphModel) {
        let ids = graph.node_ids();
        let n = ids.len();
        let index: BTreeMap<NodeId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let cells = n.saturating_mul(n);

        self.ids = ids;
        self.index = index;
        self.dist = vec![None; cells];
        self.next = vec![None; cells];
        self.links = BTreeMap::new();

        for i in 0..n {
            self.set(i, i, Decimal::ZERO, i);
        }

        for e in graph.edges() {
            let Some((mode, cost)) = edge::effective_cost(e) else {
                continue;
            };
            let (Some(&a), Some(&b)) = (self.index.get(&e.a), self.index.get(&e.b)) else {
                continue;
            };
            let link = Link {
                edge: e.id,
                mode,
                cost,
                pipeline_owner: match mode {
                    TransportMode::Pipeline => e.pipeline.as_ref().map(|p| p.owner),
                    TransportMode::Road | TransportMode::Rail => None,
                },
            };
            self.set(a, b, cost, b);
            self.set(b, a, cost, a);
            self.links.insert((a, b), link);
            self.links.insert((b, a), link);
        }

        for k in 0..n {
            for i in 0..n {
                let Some(ik) = self.dist_at(i, k) else {
                    continue;
                };
                let Some(hop) = self.next_at(i, k) else {
                    continue;
                };
                for j in 0..n {
                    let Some(kj) = self.dist_at(k, j) else {
                        continue;
                    };
                    let Some(candidate) = ik.checked_add(kj) else {
                        continue;
                    };
                    if self.dist_at(i, j).is_none_or(|current| candidate < current) {
                        self.set(i, j, candidate, hop);
                    }
                }
            }
        }

        debug!(
            nodes = n,
            links = self.links.len() / 2,
            "Pathfinder rebuilt"
        );
    }

    /// Cheapest per-barrel cost from `a` to `b`, `None` when unreachable or
    /// when either node is unknown.
    pub fn shortest_cost(&self, a: NodeId, b: NodeId) -> Option<Decimal> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        self.dist_at(i, j)
    }

    /// Whether `b` can be reached from `a`.
    pub fn is_reachable(&self, a: NodeId, b: NodeId) -> bool {
        self.shortest_cost(a, b).is_some()
    }

    /// Node sequence of the cheapest path from `a` to `b`, both inclusive.
    pub fn shortest_path(&self, a: NodeId, b: NodeId) -> Option<Vec<NodeId>> {
        let indices = self.path_indices(a, b)?;
        indices
            .into_iter()
            .map(|i| self.ids.get(i).copied())
            .collect()
    }

    /// The cheapest path from `a` to `b` broken down into edges and modes.
    pub fn detailed_route(&self, a: NodeId, b: NodeId) -> Option<DetailedRoute> {
        let indices = self.path_indices(a, b)?;
        let mut route = DetailedRoute::default();
        for pair in indices.windows(2) {
            let &[from, to] = pair else {
                return None;
            };
            let link = self.links.get(&(from, to))?;
            route.segments.push(RouteSegment {
                edge: link.edge,
                from: *self.ids.get(from)?,
                to: *self.ids.get(to)?,
                mode: link.mode,
                cost: link.cost,
                pipeline_owner: link.pipeline_owner,
            });
            route.total_cost = route.total_cost.checked_add(link.cost)?;
        }
        Some(route)
    }

    fn path_indices(&self, a: NodeId, b: NodeId) -> Option<Vec<usize>> {
        let start = *self.index.get(&a)?;
        let goal = *self.index.get(&b)?;
        self.dist_at(start, goal)?;

        let mut path = vec![start];
        let mut current = start;
        while current != goal {
            current = self.next_at(current, goal)?;
            path.push(current);
            if path.len() > self.ids.len() {
                // A cycle would mean corrupted matrices.
                return None;
            }
        }
        Some(path)
    }

    fn cell(&self, i: usize, j: usize) -> Option<usize> {
        i.checked_mul(self.ids.len())?.checked_add(j)
    }

    fn dist_at(&self, i: usize, j: usize) -> Option<Decimal> {
        self.cell(i, j).and_then(|c| self.dist.get(c).copied().flatten())
    }

    fn next_at(&self, i: usize, j: usize) -> Option<usize> {
        self.cell(i, j).and_then(|c| self.next.get(c).copied().flatten())
    }

    fn set(&mut self, i: usize, j: usize, cost: Decimal, hop: usize) {
        let Some(c) = self.cell(i, j) else {
            return;
        };
        if let Some(slot) = self.dist.get_mut(c) {
            *slot = Some(cost);
        }
        if let Some(slot) = self.next.get_mut(c) {
            *slot = Some(hop);
        }
    }
}

#[cfg(test)]
mod tests {
    use oilnet_types::{Edge, ModeLink, Node, PipelineLink};
    use rust_decimal_macros::dec;

    use super::*;

    fn node(id: u32) -> Node {
        Node::new(NodeId::new(id), format!("N{id}"))
    }

    fn road(id: u32, a: u32, b: u32, cost: Decimal) -> Edge {
        Edge::road(EdgeId::new(id), NodeId::new(a), NodeId::new(b), cost)
    }

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    /// Square 1-2-3-4 with a diagonal 1-3, plus an isolated node 5.
    fn square() -> GraphModel {
        let built = GraphModel::from_parts(
            vec![node(1), node(2), node(3), node(4), node(5)],
            vec![
                road(1, 1, 2, dec!(2)),
                road(2, 2, 3, dec!(2)),
                road(3, 3, 4, dec!(1)),
                road(4, 4, 1, dec!(7)),
                road(5, 1, 3, dec!(5)),
            ],
        );
        assert!(built.is_ok());
        built.unwrap_or_default()
    }

    #[test]
    fn self_distance_is_zero() {
        let pf = Pathfinder::from_graph(&square());
        for id in 1..=5 {
            assert_eq!(pf.shortest_cost(n(id), n(id)), Some(Decimal::ZERO));
        }
    }

    #[test]
    fn relaxes_through_intermediates() {
        let pf = Pathfinder::from_graph(&square());
        assert_eq!(pf.shortest_cost(n(1), n(3)), Some(dec!(4)));
        assert_eq!(pf.shortest_cost(n(1), n(4)), Some(dec!(5)));
        assert_eq!(
            pf.shortest_path(n(1), n(4)),
            Some(vec![n(1), n(2), n(3), n(4)])
        );
    }

    #[test]
    fn disconnected_nodes_are_unreachable() {
        let pf = Pathfinder::from_graph(&square());
        assert_eq!(pf.shortest_cost(n(1), n(5)), None);
        assert_eq!(pf.shortest_path(n(5), n(2)), None);
        assert!(pf.detailed_route(n(1), n(5)).is_none());
        assert!(!pf.is_reachable(n(5), n(1)));
    }

    #[test]
    fn unknown_nodes_are_unreachable() {
        let pf = Pathfinder::from_graph(&square());
        assert_eq!(pf.shortest_cost(n(1), n(99)), None);
    }

    #[test]
    fn detailed_route_attributes_edges() {
        let pf = Pathfinder::from_graph(&square());
        let route = pf.detailed_route(n(4), n(1));
        assert!(route.is_some());
        let route = route.unwrap_or_default();
        let edges: Vec<EdgeId> = route.segments.iter().map(|s| s.edge).collect();
        assert_eq!(edges, vec![EdgeId::new(3), EdgeId::new(2), EdgeId::new(1)]);
        assert_eq!(route.total_cost, dec!(5));
        assert_eq!(route.pipeline_segments().count(), 0);
    }

    #[test]
    fn route_to_self_has_no_segments() {
        let pf = Pathfinder::from_graph(&square());
        let route = pf.detailed_route(n(2), n(2)).unwrap_or_default();
        assert!(route.segments.is_empty());
        assert_eq!(route.total_cost, Decimal::ZERO);
    }

    #[test]
    fn pipeline_segment_records_owner() {
        let mut graph = square();
        if let Some(e) = graph.edge_mut(EdgeId::new(4)) {
            e.pipeline = Some(PipelineLink {
                owner: PlayerId::new(9),
                capacity: dec!(100),
                fee: dec!(1),
                flow: Decimal::ZERO,
            });
        }
        let pf = Pathfinder::from_graph(&graph);
        assert_eq!(pf.shortest_cost(n(1), n(4)), Some(dec!(1)));
        let route = pf.detailed_route(n(1), n(4)).unwrap_or_default();
        let owners: Vec<Option<PlayerId>> =
            route.pipeline_segments().map(|s| s.pipeline_owner).collect();
        assert_eq!(owners, vec![Some(PlayerId::new(9))]);
    }

    #[test]
    fn rail_availability_changes_costs_after_rebuild() {
        let mut graph = square();
        if let Some(e) = graph.edge_mut(EdgeId::new(5)) {
            e.modes.insert(
                TransportMode::Rail,
                ModeLink {
                    available: true,
                    cost: dec!(1),
                },
            );
        }
        let mut pf = Pathfinder::from_graph(&graph);
        assert_eq!(pf.shortest_cost(n(1), n(3)), Some(dec!(1)));

        if let Some(rail) = graph
            .edge_mut(EdgeId::new(5))
            .and_then(|e| e.modes.get_mut(&TransportMode::Rail))
        {
            rail.available = false;
        }
        // Stale until rebuilt.
        assert_eq!(pf.shortest_cost(n(1), n(3)), Some(dec!(1)));
        pf.rebuild(&graph);
        assert_eq!(pf.shortest_cost(n(1), n(3)), Some(dec!(4)));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let graph = square();
        let mut pf = Pathfinder::from_graph(&graph);
        let first = pf.clone();
        pf.rebuild(&graph);
        assert_eq!(pf, first);
    }
}
