//! Core entity structs for the Oilnet economy.
//!
//! Nodes carry an explicit set of optional role records instead of fields
//! that appear or disappear with the role. Runtime counters (`extracted`,
//! `throughput`, `flow`, `served`, ...) default to zero on deserialization so
//! generated maps only need to declare the static attributes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{LedgerEntryType, NodeRole, Party, TransportMode};
use crate::ids::{EdgeId, NodeId, PlayerId};

// ---------------------------------------------------------------------------
// Node roles
// ---------------------------------------------------------------------------

/// Map position. Only the renderer and the generator care about it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    #[ts(as = "String")]
    pub x: Decimal,
    /// Vertical coordinate.
    #[ts(as = "String")]
    pub y: Decimal,
}

/// Crude extraction role. A well exists once `owner` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProductionSite {
    /// Rated extraction capacity in barrels per turn.
    #[ts(as = "String")]
    pub capacity: Decimal,
    /// Lifting cost per barrel of rated capacity.
    #[ts(as = "String")]
    pub operating_cost: Decimal,
    /// Cash needed to build the well.
    #[ts(as = "String")]
    pub construction_cost: Decimal,
    /// Owner of the well, if one has been built.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Barrels sold from this well in the current turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub extracted: Decimal,
}

impl ProductionSite {
    /// Whether a well is operating here.
    pub const fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    /// Capacity not yet sold this turn.
    pub fn remaining(&self) -> Decimal {
        self.capacity.saturating_sub(self.extracted).max(Decimal::ZERO)
    }
}

/// Refining role. A refinery exists once `owner` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProcessingSite {
    /// Throughput in barrels per turn before upgrades.
    #[ts(as = "String")]
    pub base_capacity: Decimal,
    /// Operating cost per processed barrel.
    #[ts(as = "String")]
    pub operating_cost: Decimal,
    /// Owner-set service fee per processed barrel.
    #[serde(default)]
    #[ts(as = "String")]
    pub fee: Decimal,
    /// Owner of the refinery, if one has been built.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Number of upgrades applied. Each one doubles capacity.
    #[serde(default)]
    pub level: u32,
    /// Barrels processed in the current turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub throughput: Decimal,
}

impl ProcessingSite {
    /// Whether a refinery is operating here.
    pub const fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    /// Rated throughput: `base_capacity * 2^level`.
    pub fn capacity(&self) -> Decimal {
        (0..self.level).fold(self.base_capacity, |cap, _| cap.saturating_mul(Decimal::TWO))
    }

    /// Throughput not yet used this turn.
    pub fn remaining(&self) -> Decimal {
        self.capacity().saturating_sub(self.throughput).max(Decimal::ZERO)
    }

    /// Fraction of rated capacity used this turn, `None` at zero capacity.
    pub fn utilization(&self) -> Option<Decimal> {
        self.throughput.checked_div(self.capacity())
    }
}

/// Demand role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConsumptionSite {
    /// Demand at the reference price, in barrels per turn. Grows every turn.
    #[ts(as = "String")]
    pub base_demand: Decimal,
    /// Per-turn compound growth rate of `base_demand`.
    #[ts(as = "String")]
    pub growth_rate: Decimal,
    /// Elastic demand derived this turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub demand: Decimal,
    /// Price posted this turn, `None` while nothing can supply the node.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub local_price: Option<Decimal>,
    /// Barrels delivered through player routes this turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub served: Decimal,
    /// Barrels imported through a terminal this turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub imported: Decimal,
}

impl ConsumptionSite {
    /// Demand neither served by a route nor imported this turn.
    pub fn unmet(&self) -> Decimal {
        self.demand
            .saturating_sub(self.served)
            .saturating_sub(self.imported)
            .max(Decimal::ZERO)
    }
}

/// Import/export terminal role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerminalSite {
    /// Terminal-specific handling fee; the market-wide fee applies when unset.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub fee_override: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node of the transport graph with its optional role records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Map position.
    #[serde(default)]
    pub position: Position,
    /// Extraction role.
    #[serde(default)]
    pub production: Option<ProductionSite>,
    /// Refining role.
    #[serde(default)]
    pub processing: Option<ProcessingSite>,
    /// Demand role.
    #[serde(default)]
    pub consumption: Option<ConsumptionSite>,
    /// Terminal role.
    #[serde(default)]
    pub terminal: Option<TerminalSite>,
}

impl Node {
    /// Create a node with no roles.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: Position::default(),
            production: None,
            processing: None,
            consumption: None,
            terminal: None,
        }
    }

    /// Whether the node holds the given role.
    pub const fn has_role(&self, role: NodeRole) -> bool {
        match role {
            NodeRole::Production => self.production.is_some(),
            NodeRole::Processing => self.processing.is_some(),
            NodeRole::Consumption => self.consumption.is_some(),
            NodeRole::Terminal => self.terminal.is_some(),
        }
    }

    /// All roles held by the node, in declaration order.
    pub fn roles(&self) -> Vec<NodeRole> {
        [
            NodeRole::Production,
            NodeRole::Processing,
            NodeRole::Consumption,
            NodeRole::Terminal,
        ]
        .into_iter()
        .filter(|role| self.has_role(*role))
        .collect()
    }

    /// Name of the first attribute holding a negative value, if any.
    pub fn first_negative_attribute(&self) -> Option<&'static str> {
        let mut checks: Vec<(&'static str, Decimal)> = Vec::new();
        if let Some(p) = &self.production {
            checks.push(("production.capacity", p.capacity));
            checks.push(("production.operating_cost", p.operating_cost));
            checks.push(("production.construction_cost", p.construction_cost));
        }
        if let Some(r) = &self.processing {
            checks.push(("processing.base_capacity", r.base_capacity));
            checks.push(("processing.operating_cost", r.operating_cost));
            checks.push(("processing.fee", r.fee));
        }
        if let Some(c) = &self.consumption {
            checks.push(("consumption.base_demand", c.base_demand));
        }
        if let Some(fee) = self.terminal.as_ref().and_then(|t| t.fee_override) {
            checks.push(("terminal.fee_override", fee));
        }
        checks
            .into_iter()
            .find(|(_, value)| value.is_sign_negative() && !value.is_zero())
            .map(|(name, _)| name)
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A non-owned transport mode on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ModeLink {
    /// Whether the mode can be used right now.
    pub available: bool,
    /// Cost per barrel to traverse the edge with this mode.
    #[ts(as = "String")]
    pub cost: Decimal,
}

/// A player-owned pipeline laid along an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PipelineLink {
    /// Pipeline owner.
    pub owner: PlayerId,
    /// Rated barrels per turn. Exceeding it is allowed but shows up in utilization.
    #[ts(as = "String")]
    pub capacity: Decimal,
    /// Owner-set fee per barrel, which is also the routing cost of the segment.
    #[ts(as = "String")]
    pub fee: Decimal,
    /// Barrels carried this turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub flow: Decimal,
}

impl PipelineLink {
    /// Fraction of rated capacity used this turn, `None` at zero capacity.
    pub fn utilization(&self) -> Option<Decimal> {
        self.flow.checked_div(self.capacity)
    }
}

/// An undirected connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Edge {
    /// Stable identifier.
    pub id: EdgeId,
    /// First endpoint.
    pub a: NodeId,
    /// Second endpoint.
    pub b: NodeId,
    /// Non-owned modes (road, rail) keyed by mode.
    pub modes: BTreeMap<TransportMode, ModeLink>,
    /// Owned pipeline, if one has been built.
    #[serde(default)]
    pub pipeline: Option<PipelineLink>,
    /// Barrels carried over this edge by any mode this turn.
    #[serde(default)]
    #[ts(as = "String")]
    pub flow: Decimal,
}

impl Edge {
    /// Create an edge with a single road mode.
    pub fn road(id: EdgeId, a: NodeId, b: NodeId, cost: Decimal) -> Self {
        let mut modes = BTreeMap::new();
        modes.insert(TransportMode::Road, ModeLink { available: true, cost });
        Self {
            id,
            a,
            b,
            modes,
            pipeline: None,
            flow: Decimal::ZERO,
        }
    }

    /// Whether the edge touches `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }

    /// Return the endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }

    /// Whether the edge joins `x` and `y` in either direction.
    pub fn connects(&self, x: NodeId, y: NodeId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// An economic agent competing for profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cash on hand.
    #[ts(as = "String")]
    pub cash: Decimal,
    /// Nodes where this player owns a well.
    pub wells: Vec<NodeId>,
    /// Nodes where this player owns a refinery.
    pub refineries: Vec<NodeId>,
    /// Edges carrying a pipeline owned by this player.
    pub pipelines: Vec<EdgeId>,
    /// Storage sites. Reserved: the core never builds storage.
    pub storage: Vec<NodeId>,
    /// Revenue earned this turn.
    #[ts(as = "String")]
    pub turn_revenue: Decimal,
    /// Operating cost charged this turn.
    #[ts(as = "String")]
    pub turn_cost: Decimal,
    /// `turn_revenue - turn_cost` once the turn is settled.
    #[ts(as = "String")]
    pub turn_profit: Decimal,
    /// Running sum of every settled turn profit.
    #[ts(as = "String")]
    pub cumulative_profit: Decimal,
    /// Cash spent on construction over the whole game.
    #[ts(as = "String")]
    pub capital_spent: Decimal,
    /// Refined barrels this player delivered to consumers this turn.
    #[ts(as = "String")]
    pub barrels_sold: Decimal,
    /// Share of all refined barrels delivered this turn, in `[0, 1]`.
    #[ts(as = "String")]
    pub market_share: Decimal,
    /// Settled profit of every completed turn, oldest first.
    #[ts(as = "Vec<String>")]
    pub profit_history: Vec<Decimal>,
}

impl Player {
    /// Create a player with starting cash and no assets.
    pub fn new(id: PlayerId, name: impl Into<String>, cash: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            cash,
            wells: Vec::new(),
            refineries: Vec::new(),
            pipelines: Vec::new(),
            storage: Vec::new(),
            turn_revenue: Decimal::ZERO,
            turn_cost: Decimal::ZERO,
            turn_profit: Decimal::ZERO,
            cumulative_profit: Decimal::ZERO,
            capital_spent: Decimal::ZERO,
            barrels_sold: Decimal::ZERO,
            market_share: Decimal::ZERO,
            profit_history: Vec::new(),
        }
    }

    /// Zero every per-turn accumulator.
    pub const fn reset_turn(&mut self) {
        self.turn_revenue = Decimal::ZERO;
        self.turn_cost = Decimal::ZERO;
        self.turn_profit = Decimal::ZERO;
        self.barrels_sold = Decimal::ZERO;
        self.market_share = Decimal::ZERO;
    }

    /// Add to this turn's revenue.
    pub fn earn(&mut self, amount: Decimal) {
        self.turn_revenue = self.turn_revenue.saturating_add(amount);
    }

    /// Add to this turn's operating cost.
    pub fn charge(&mut self, amount: Decimal) {
        self.turn_cost = self.turn_cost.saturating_add(amount);
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// Global reference prices and demand parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketState {
    /// Global crude price per barrel.
    #[ts(as = "String")]
    pub crude_price: Decimal,
    /// Global refined product price per barrel.
    #[ts(as = "String")]
    pub refined_price: Decimal,
    /// Price at which a node's demand equals its base demand.
    #[ts(as = "String")]
    pub reference_price: Decimal,
    /// Demand elasticity exponent.
    #[ts(as = "String")]
    pub elasticity: Decimal,
    /// Default per-barrel terminal handling fee.
    #[ts(as = "String")]
    pub terminal_fee: Decimal,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One cash movement between two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Sequence number, unique within a ledger.
    pub seq: u64,
    /// Turn the movement belongs to.
    pub turn: u64,
    /// Category of movement.
    pub entry_type: LedgerEntryType,
    /// Paying party.
    pub from: Party,
    /// Receiving party.
    pub to: Party,
    /// Amount of cash (always positive).
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Short machine-readable reason such as `"CRUDE_SALE"`.
    pub reason: String,
    /// Node the movement relates to, if any.
    pub node: Option<NodeId>,
    /// Edge the movement relates to, if any.
    pub edge: Option<EdgeId>,
}

// ---------------------------------------------------------------------------
// Snapshots and summaries
// ---------------------------------------------------------------------------

/// Per-player figures recorded at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerTurnRecord {
    /// Player.
    pub player: PlayerId,
    /// Cash after settlement.
    #[ts(as = "String")]
    pub cash: Decimal,
    /// Profit settled this turn.
    #[ts(as = "String")]
    pub profit: Decimal,
    /// Cumulative profit after this turn.
    #[ts(as = "String")]
    pub cumulative_profit: Decimal,
}

/// Append-only history record of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnSnapshot {
    /// Turn number (first turn is 1).
    pub turn: u64,
    /// Crude price during the turn.
    #[ts(as = "String")]
    pub crude_price: Decimal,
    /// Refined price during the turn.
    #[ts(as = "String")]
    pub refined_price: Decimal,
    /// Every player's settled figures, ordered by player id.
    pub players: Vec<PlayerTurnRecord>,
}

/// Read-only view of a player for the UI and decision callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSummary {
    /// Player.
    pub player: PlayerId,
    /// Display name.
    pub name: String,
    /// Cash on hand.
    #[ts(as = "String")]
    pub cash: Decimal,
    /// Profit of the last settled turn.
    #[ts(as = "String")]
    pub turn_profit: Decimal,
    /// Cumulative profit.
    #[ts(as = "String")]
    pub cumulative_profit: Decimal,
    /// Number of wells owned.
    pub wells: u32,
    /// Number of refineries owned.
    pub refineries: u32,
    /// Number of pipelines owned.
    pub pipelines: u32,
    /// Number of storage sites owned.
    pub storage: u32,
    /// Share of refined barrels delivered last turn.
    #[ts(as = "String")]
    pub market_share: Decimal,
}

/// Read-only view of the whole market for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketSummary {
    /// Number of completed turns.
    pub turn: u64,
    /// Global crude price.
    #[ts(as = "String")]
    pub crude_price: Decimal,
    /// Global refined price.
    #[ts(as = "String")]
    pub refined_price: Decimal,
    /// Rated capacity of every active well.
    #[ts(as = "String")]
    pub total_production: Decimal,
    /// Elastic demand summed over consumption nodes.
    #[ts(as = "String")]
    pub total_demand: Decimal,
    /// Barrels delivered through player routes.
    #[ts(as = "String")]
    pub total_served: Decimal,
    /// Barrels imported through terminals.
    #[ts(as = "String")]
    pub imports: Decimal,
    /// Surplus crude exported through terminals.
    #[ts(as = "String")]
    pub exports: Decimal,
    /// `imports - exports`; positive means the map is a net importer.
    #[ts(as = "String")]
    pub net_imports: Decimal,
    /// Demand left unmet.
    #[ts(as = "String")]
    pub unmet_demand: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn refinery(base: Decimal, level: u32) -> ProcessingSite {
        ProcessingSite {
            base_capacity: base,
            operating_cost: dec!(2),
            fee: dec!(5),
            owner: Some(PlayerId::new(1)),
            level,
            throughput: Decimal::ZERO,
        }
    }

    #[test]
    fn refinery_capacity_doubles_per_level() {
        assert_eq!(refinery(dec!(100), 0).capacity(), dec!(100));
        assert_eq!(refinery(dec!(100), 1).capacity(), dec!(200));
        assert_eq!(refinery(dec!(100), 3).capacity(), dec!(800));
    }

    #[test]
    fn refinery_remaining_never_negative() {
        let mut site = refinery(dec!(100), 0);
        site.throughput = dec!(150);
        assert_eq!(site.remaining(), Decimal::ZERO);
        assert_eq!(site.utilization(), Some(dec!(1.5)));
    }

    #[test]
    fn node_roles_follow_records() {
        let mut node = Node::new(NodeId::new(1), "Hub");
        assert!(node.roles().is_empty());
        node.terminal = Some(TerminalSite::default());
        node.consumption = Some(ConsumptionSite {
            base_demand: dec!(50),
            growth_rate: dec!(0.01),
            demand: Decimal::ZERO,
            local_price: None,
            served: Decimal::ZERO,
            imported: Decimal::ZERO,
        });
        assert_eq!(node.roles(), vec![NodeRole::Consumption, NodeRole::Terminal]);
        assert!(!node.has_role(NodeRole::Production));
    }

    #[test]
    fn negative_attribute_is_reported() {
        let mut node = Node::new(NodeId::new(1), "Field");
        node.production = Some(ProductionSite {
            capacity: dec!(-1),
            operating_cost: dec!(10),
            construction_cost: dec!(500),
            owner: None,
            extracted: Decimal::ZERO,
        });
        assert_eq!(node.first_negative_attribute(), Some("production.capacity"));
    }

    #[test]
    fn edge_other_end() {
        let edge = Edge::road(EdgeId::new(0), NodeId::new(1), NodeId::new(2), dec!(3));
        assert_eq!(edge.other_end(NodeId::new(1)), Some(NodeId::new(2)));
        assert_eq!(edge.other_end(NodeId::new(2)), Some(NodeId::new(1)));
        assert_eq!(edge.other_end(NodeId::new(3)), None);
        assert!(edge.connects(NodeId::new(2), NodeId::new(1)));
    }

    #[test]
    fn node_deserializes_without_runtime_counters() {
        let json = r#"{
            "id": 4,
            "name": "Field",
            "production": { "capacity": "100", "operating_cost": "10", "construction_cost": "500" }
        }"#;
        let node: Result<Node, _> = serde_json::from_str(json);
        assert!(node.is_ok());
        let node = node.ok();
        let site = node.as_ref().and_then(|n| n.production.as_ref());
        assert_eq!(site.map(|s| s.extracted), Some(Decimal::ZERO));
        assert_eq!(site.and_then(|s| s.owner), None);
    }

    #[test]
    fn player_reset_clears_turn_figures() {
        let mut player = Player::new(PlayerId::new(1), "Ada", dec!(1000));
        player.earn(dec!(50));
        player.charge(dec!(20));
        player.cumulative_profit = dec!(30);
        player.reset_turn();
        assert_eq!(player.turn_revenue, Decimal::ZERO);
        assert_eq!(player.turn_cost, Decimal::ZERO);
        assert_eq!(player.cumulative_profit, dec!(30));
    }
}
