//! Read-only views of a game between turns.

use oilnet_types::{
    Edge, EdgeId, MarketSummary, Node, NodeId, Player, PlayerId, PlayerSummary, TurnSnapshot,
};
use rust_decimal::Decimal;

use crate::game::GameState;

fn count(items: usize) -> u32 {
    u32::try_from(items).unwrap_or(u32::MAX)
}

fn summarize(player: &Player) -> PlayerSummary {
    PlayerSummary {
        player: player.id,
        name: player.name.clone(),
        cash: player.cash,
        turn_profit: player.turn_profit,
        cumulative_profit: player.cumulative_profit,
        wells: count(player.wells.len()),
        refineries: count(player.refineries.len()),
        pipelines: count(player.pipelines.len()),
        storage: count(player.storage.len()),
        market_share: player.market_share,
    }
}

impl GameState {
    /// Summary of one player, or `None` for an unknown id.
    pub fn player_summary(&self, id: PlayerId) -> Option<PlayerSummary> {
        self.players.get(&id).map(summarize)
    }

    /// Summaries of every player in id order.
    pub fn player_summaries(&self) -> Vec<PlayerSummary> {
        self.players.values().map(summarize).collect()
    }

    /// Market-wide totals as of the last resolved turn.
    ///
    /// Production is the rated capacity of every active well; demand,
    /// served, imported and unmet volumes come from the consumption sites.
    pub fn market_summary(&self) -> MarketSummary {
        let total_production = self
            .graph
            .nodes()
            .filter_map(|n| n.production.as_ref().filter(|s| s.is_active()))
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.capacity));

        let mut total_demand = Decimal::ZERO;
        let mut total_served = Decimal::ZERO;
        let mut imports = Decimal::ZERO;
        let mut unmet_demand = Decimal::ZERO;
        for site in self.graph.nodes().filter_map(|n| n.consumption.as_ref()) {
            total_demand = total_demand.saturating_add(site.demand);
            total_served = total_served.saturating_add(site.served);
            imports = imports.saturating_add(site.imported);
            unmet_demand = unmet_demand.saturating_add(site.unmet());
        }
        let exports = self
            .last_summary
            .as_ref()
            .map_or(Decimal::ZERO, |s| s.exported);

        MarketSummary {
            turn: self.turn(),
            crude_price: self.market.crude_price,
            refined_price: self.market.refined_price,
            total_production,
            total_demand,
            total_served,
            imports,
            exports,
            net_imports: imports.saturating_sub(exports),
            unmet_demand,
        }
    }

    /// Copy of a node with its current counters.
    pub fn node_snapshot(&self, id: NodeId) -> Option<Node> {
        self.graph.node(id).cloned()
    }

    /// Copy of an edge with its current flow.
    pub fn edge_snapshot(&self, id: EdgeId) -> Option<Edge> {
        self.graph.edge(id).cloned()
    }

    /// One snapshot per completed turn, oldest first.
    pub fn history(&self) -> &[TurnSnapshot] {
        &self.history
    }
}
