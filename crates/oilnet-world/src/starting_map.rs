//! Default sample map for the Oilnet economy.
//!
//! Nine nodes in one connected component: three oil fields, two refinery
//! sites (one of them also a market town), three more demand centers with a
//! coastal import terminal among them, and a plain crossroads. Two edges
//! carry rail; the coastal line is still closed. Used by the engine when no
//! scenario file is given and by tests that need a realistic map.

use std::collections::BTreeMap;

use oilnet_types::{
    ConsumptionSite, Edge, EdgeId, ModeLink, Node, NodeId, NodeRole, Position, ProcessingSite,
    ProductionSite, TerminalSite, TransportMode,
};
use rust_decimal::Decimal;

use crate::error::WorldError;
use crate::graph::GraphModel;

/// Identifiers of the sample map's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleMapIds {
    /// Coastal import terminal and port town.
    pub port: NodeId,
    /// Northern oil field.
    pub northfield: NodeId,
    /// Small, cheap oil field.
    pub sandhill: NodeId,
    /// Large, remote oil field.
    pub eastbasin: NodeId,
    /// Inland refinery site.
    pub junction: NodeId,
    /// Riverside refinery site and market town.
    pub riverside: NodeId,
    /// Largest demand center.
    pub capital: NodeId,
    /// Mountain town.
    pub highland: NodeId,
    /// Plain junction with no role.
    pub crossroads: NodeId,
}

/// Node ids used by [`create_sample_map`].
pub const SAMPLE_MAP_IDS: SampleMapIds = SampleMapIds {
    port: NodeId(0),
    northfield: NodeId(1),
    sandhill: NodeId(2),
    eastbasin: NodeId(3),
    junction: NodeId(4),
    riverside: NodeId(5),
    capital: NodeId(6),
    highland: NodeId(7),
    crossroads: NodeId(8),
};

fn at(id: NodeId, name: &str, x: i64, y: i64) -> Node {
    let mut node = Node::new(id, name);
    node.position = Position {
        x: Decimal::from(x),
        y: Decimal::from(y),
    };
    node
}

fn field(node: &mut Node, capacity: i64, operating_cost: i64, construction_cost: i64) {
    node.production = Some(ProductionSite {
        capacity: Decimal::from(capacity),
        operating_cost: Decimal::from(operating_cost),
        construction_cost: Decimal::from(construction_cost),
        owner: None,
        extracted: Decimal::ZERO,
    });
}

fn refinery_site(node: &mut Node, base_capacity: i64, operating_cost: i64) {
    node.processing = Some(ProcessingSite {
        base_capacity: Decimal::from(base_capacity),
        operating_cost: Decimal::from(operating_cost),
        fee: Decimal::ZERO,
        owner: None,
        level: 0,
        throughput: Decimal::ZERO,
    });
}

/// `growth_permille` is the per-turn growth rate in thousandths.
fn market(node: &mut Node, base_demand: i64, growth_permille: i64) {
    node.consumption = Some(ConsumptionSite {
        base_demand: Decimal::from(base_demand),
        growth_rate: Decimal::new(growth_permille, 3),
        demand: Decimal::ZERO,
        local_price: None,
        served: Decimal::ZERO,
        imported: Decimal::ZERO,
    });
}

fn road(id: u32, a: NodeId, b: NodeId, cost: i64) -> Edge {
    Edge::road(EdgeId(id), a, b, Decimal::from(cost))
}

fn with_rail(mut edge: Edge, cost: i64, available: bool) -> Edge {
    edge.modes.insert(
        TransportMode::Rail,
        ModeLink {
            available,
            cost: Decimal::from(cost),
        },
    );
    edge
}

/// Build the sample map.
///
/// # Errors
///
/// Returns a [`WorldError`] only if the hard-coded map violates a graph
/// invariant, which the tests below rule out.
pub fn create_sample_map() -> Result<(GraphModel, SampleMapIds), WorldError> {
    let ids = SAMPLE_MAP_IDS;

    let mut port = at(ids.port, "Port Meridian", 0, 40);
    port.terminal = Some(TerminalSite::default());
    market(&mut port, 90, 15);

    let mut northfield = at(ids.northfield, "Northfield", 50, 95);
    field(&mut northfield, 120, 12, 2400);

    let mut sandhill = at(ids.sandhill, "Sandhill", 30, 80);
    field(&mut sandhill, 80, 8, 1800);

    let mut eastbasin = at(ids.eastbasin, "Eastbasin", 100, 85);
    field(&mut eastbasin, 150, 14, 2800);

    let mut junction = at(ids.junction, "Junction", 50, 70);
    refinery_site(&mut junction, 100, 3);

    let mut riverside = at(ids.riverside, "Riverside", 30, 50);
    refinery_site(&mut riverside, 120, 4);
    market(&mut riverside, 40, 10);

    let mut capital = at(ids.capital, "Capital", 55, 40);
    market(&mut capital, 140, 20);

    let mut highland = at(ids.highland, "Highland", 90, 45);
    market(&mut highland, 60, 10);

    let crossroads = at(ids.crossroads, "Crossroads", 80, 70);

    let nodes = vec![
        port, northfield, sandhill, eastbasin, junction, riverside, capital, highland, crossroads,
    ];

    let edges = vec![
        road(0, ids.northfield, ids.junction, 2),
        road(1, ids.sandhill, ids.junction, 3),
        road(2, ids.eastbasin, ids.crossroads, 2),
        with_rail(road(3, ids.crossroads, ids.junction, 2), 1, true),
        road(4, ids.junction, ids.capital, 3),
        road(5, ids.junction, ids.riverside, 2),
        road(6, ids.riverside, ids.port, 2),
        with_rail(road(7, ids.port, ids.capital, 5), 3, false),
        road(8, ids.capital, ids.highland, 4),
        road(9, ids.crossroads, ids.highland, 3),
        road(10, ids.riverside, ids.capital, 2),
    ];

    let graph = GraphModel::from_parts(nodes, edges)?;
    Ok((graph, ids))
}

/// Count of nodes per role in the sample map, for quick sanity checks.
pub fn role_census(graph: &GraphModel) -> BTreeMap<NodeRole, usize> {
    let mut census = BTreeMap::new();
    for node in graph.nodes() {
        for role in node.roles() {
            *census.entry(role).or_insert(0_usize) += 1;
        }
    }
    census
}
