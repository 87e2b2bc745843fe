//! Cheapest-supply search for a consumption point.
//!
//! For a consumer the search compares importing refined product through the
//! cheapest terminal against every pairing of an active well with spare
//! capacity and an active refinery with spare throughput:
//!
//! ```text
//! landed = extraction_cost + transport(well -> refinery)
//!        + processing_cost + processing_fee + transport(refinery -> consumer)
//! ```
//!
//! The search is exhaustive over well x refinery pairs. Ties resolve
//! deterministically: import beats an equally priced route, and among equal
//! routes the lowest (well id, refinery id) pair wins.

use oilnet_types::{NodeId, NodeRole};
use rust_decimal::Decimal;

use crate::graph::GraphModel;
use crate::pathfinder::Pathfinder;

/// Prices the search needs from the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyPricing {
    /// Global refined price per barrel.
    pub refined_price: Decimal,
    /// Terminal handling fee used where a terminal has no override.
    pub terminal_fee: Decimal,
}

/// Landed cost of importing through a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImportQuote {
    /// Terminal the product comes through.
    pub terminal: NodeId,
    /// Transport from the terminal to the consumer.
    pub transport_cost: Decimal,
    /// Terminal handling fee applied.
    pub terminal_fee: Decimal,
    /// `refined_price + terminal_fee + transport_cost`.
    pub landed_cost: Decimal,
}

/// Per-barrel netback of exporting crude through a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportQuote {
    /// Terminal the crude leaves through.
    pub terminal: NodeId,
    /// Transport from the well to the terminal.
    pub transport_cost: Decimal,
    /// Terminal handling fee applied.
    pub terminal_fee: Decimal,
    /// `crude_price - terminal_fee - transport_cost`; may be negative.
    pub netback: Decimal,
}

/// A priced well -> refinery -> consumer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RouteQuote {
    /// Well supplying crude.
    pub production: NodeId,
    /// Refinery processing it.
    pub processing: NodeId,
    /// Consumer being supplied.
    pub consumer: NodeId,
    /// Lifting cost per barrel at the well.
    pub extraction_cost: Decimal,
    /// Transport from well to refinery.
    pub inbound_cost: Decimal,
    /// Refinery operating cost per barrel.
    pub processing_cost: Decimal,
    /// Refinery owner's fee per barrel.
    pub processing_fee: Decimal,
    /// Transport from refinery to consumer.
    pub outbound_cost: Decimal,
    /// Transport-adjusted crude price: `extraction_cost + inbound_cost`.
    pub crude_price: Decimal,
    /// Total per-barrel cost at the consumer.
    pub landed_cost: Decimal,
    /// Barrels the chain can still carry this turn.
    pub available: Decimal,
}

/// Outcome of [`Pathfinder::find_cheapest_supply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SupplyQuote {
    /// Import through a terminal is cheapest (or the only option).
    Import(ImportQuote),
    /// A player-owned chain is strictly cheaper than importing.
    Route(RouteQuote),
    /// Nothing can reach the consumer this turn.
    Unsupplied,
}

impl SupplyQuote {
    /// Per-barrel price at the consumer, `None` when unsupplied.
    pub const fn landed_cost(&self) -> Option<Decimal> {
        match self {
            Self::Import(quote) => Some(quote.landed_cost),
            Self::Route(quote) => Some(quote.landed_cost),
            Self::Unsupplied => None,
        }
    }
}

fn terminal_fee(graph: &GraphModel, terminal: NodeId, default_fee: Decimal) -> Decimal {
    graph
        .node(terminal)
        .and_then(|n| n.terminal.as_ref())
        .and_then(|t| t.fee_override)
        .unwrap_or(default_fee)
}

impl Pathfinder {
    /// Cheapest terminal to import refined product into `consumer`.
    pub fn nearest_import(
        &self,
        graph: &GraphModel,
        consumer: NodeId,
        pricing: &SupplyPricing,
    ) -> Option<ImportQuote> {
        let mut best: Option<ImportQuote> = None;
        for terminal in graph.nodes_with_role(NodeRole::Terminal) {
            let Some(transport_cost) = self.shortest_cost(terminal, consumer) else {
                continue;
            };
            let fee = terminal_fee(graph, terminal, pricing.terminal_fee);
            let Some(landed_cost) = pricing
                .refined_price
                .checked_add(fee)
                .and_then(|v| v.checked_add(transport_cost))
            else {
                continue;
            };
            if best.is_none_or(|b| landed_cost < b.landed_cost) {
                best = Some(ImportQuote {
                    terminal,
                    transport_cost,
                    terminal_fee: fee,
                    landed_cost,
                });
            }
        }
        best
    }

    /// Terminal giving the best crude netback for barrels leaving `origin`.
    pub fn best_export(
        &self,
        graph: &GraphModel,
        origin: NodeId,
        crude_price: Decimal,
        default_fee: Decimal,
    ) -> Option<ExportQuote> {
        let mut best: Option<ExportQuote> = None;
        for terminal in graph.nodes_with_role(NodeRole::Terminal) {
            let Some(transport_cost) = self.shortest_cost(origin, terminal) else {
                continue;
            };
            let fee = terminal_fee(graph, terminal, default_fee);
            let Some(netback) = crude_price
                .checked_sub(fee)
                .and_then(|v| v.checked_sub(transport_cost))
            else {
                continue;
            };
            if best.is_none_or(|b| netback > b.netback) {
                best = Some(ExportQuote {
                    terminal,
                    transport_cost,
                    terminal_fee: fee,
                    netback,
                });
            }
        }
        best
    }

    /// Cheapest well -> refinery chain into `consumer` with spare capacity
    /// at both ends.
    pub fn cheapest_route(&self, graph: &GraphModel, consumer: NodeId) -> Option<RouteQuote> {
        let refineries: Vec<(NodeId, Decimal, Decimal, Decimal, Decimal)> = graph
            .nodes()
            .filter_map(|n| {
                let site = n.processing.as_ref().filter(|s| s.is_active())?;
                let remaining = site.remaining();
                if remaining <= Decimal::ZERO {
                    return None;
                }
                let outbound = self.shortest_cost(n.id, consumer)?;
                Some((n.id, site.operating_cost, site.fee, outbound, remaining))
            })
            .collect();

        let mut best: Option<RouteQuote> = None;
        for well in graph.nodes() {
            let Some(site) = well.production.as_ref().filter(|s| s.is_active()) else {
                continue;
            };
            let well_remaining = site.remaining();
            if well_remaining <= Decimal::ZERO {
                continue;
            }
            for &(refinery, processing_cost, processing_fee, outbound_cost, refinery_remaining) in
                &refineries
            {
                let Some(inbound_cost) = self.shortest_cost(well.id, refinery) else {
                    continue;
                };
                let Some(crude_price) = site.operating_cost.checked_add(inbound_cost) else {
                    continue;
                };
                let Some(landed_cost) = crude_price
                    .checked_add(processing_cost)
                    .and_then(|v| v.checked_add(processing_fee))
                    .and_then(|v| v.checked_add(outbound_cost))
                else {
                    continue;
                };
                if best.is_none_or(|b| landed_cost < b.landed_cost) {
                    best = Some(RouteQuote {
                        production: well.id,
                        processing: refinery,
                        consumer,
                        extraction_cost: site.operating_cost,
                        inbound_cost,
                        processing_cost,
                        processing_fee,
                        outbound_cost,
                        crude_price,
                        landed_cost,
                        available: well_remaining.min(refinery_remaining),
                    });
                }
            }
        }
        best
    }

    /// The cheapest way to supply `consumer` right now.
    ///
    /// A route wins only when strictly cheaper than importing, so the
    /// returned landed cost never exceeds the import price.
    pub fn find_cheapest_supply(
        &self,
        graph: &GraphModel,
        consumer: NodeId,
        pricing: &SupplyPricing,
    ) -> SupplyQuote {
        let import = self.nearest_import(graph, consumer, pricing);
        let route = self.cheapest_route(graph, consumer);
        match (import, route) {
            (Some(i), Some(r)) if r.landed_cost < i.landed_cost => SupplyQuote::Route(r),
            (Some(i), _) => SupplyQuote::Import(i),
            (None, Some(r)) => SupplyQuote::Route(r),
            (None, None) => SupplyQuote::Unsupplied,
        }
    }
}

#[cfg(test)]
mod tests {
    use oilnet_types::{
        ConsumptionSite, Edge, EdgeId, Node, PlayerId, ProcessingSite, ProductionSite,
        TerminalSite,
    };
    use rust_decimal_macros::dec;

    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    fn well(id: u32, capacity: Decimal, cost: Decimal) -> Node {
        let mut node = Node::new(n(id), format!("Well {id}"));
        node.production = Some(ProductionSite {
            capacity,
            operating_cost: cost,
            construction_cost: dec!(1000),
            owner: Some(PlayerId::new(1)),
            extracted: Decimal::ZERO,
        });
        node
    }

    fn refinery(id: u32, capacity: Decimal, cost: Decimal, fee: Decimal) -> Node {
        let mut node = Node::new(n(id), format!("Refinery {id}"));
        node.processing = Some(ProcessingSite {
            base_capacity: capacity,
            operating_cost: cost,
            fee,
            owner: Some(PlayerId::new(2)),
            level: 0,
            throughput: Decimal::ZERO,
        });
        node
    }

    fn town(id: u32, base: Decimal) -> Node {
        let mut node = Node::new(n(id), format!("Town {id}"));
        node.consumption = Some(ConsumptionSite {
            base_demand: base,
            growth_rate: Decimal::ZERO,
            demand: base,
            local_price: None,
            served: Decimal::ZERO,
            imported: Decimal::ZERO,
        });
        node
    }

    fn terminal(id: u32) -> Node {
        let mut node = Node::new(n(id), format!("Terminal {id}"));
        node.terminal = Some(TerminalSite::default());
        node
    }

    fn road(id: u32, a: u32, b: u32, cost: Decimal) -> Edge {
        Edge::road(EdgeId::new(id), n(a), n(b), cost)
    }

    fn pricing(refined: Decimal) -> SupplyPricing {
        SupplyPricing {
            refined_price: refined,
            terminal_fee: dec!(3),
        }
    }

    /// P(1) -1- R(2) -1- D(3); no terminal.
    fn chain() -> GraphModel {
        GraphModel::from_parts(
            vec![
                well(1, dec!(100), dec!(10)),
                refinery(2, dec!(100), dec!(2), dec!(5)),
                town(3, dec!(50)),
            ],
            vec![road(1, 1, 2, dec!(1)), road(2, 2, 3, dec!(1))],
        )
        .unwrap_or_default()
    }

    #[test]
    fn chain_without_terminal_routes_through_refinery() {
        let graph = chain();
        let pf = Pathfinder::from_graph(&graph);
        let quote = pf.find_cheapest_supply(&graph, n(3), &pricing(dec!(80)));
        assert!(matches!(quote, SupplyQuote::Route(_)));
        if let SupplyQuote::Route(route) = quote {
            assert_eq!(route.crude_price, dec!(11));
            assert_eq!(route.landed_cost, dec!(19));
            assert_eq!(route.available, dec!(100));
        }
    }

    #[test]
    fn import_wins_ties() {
        let mut graph = chain();
        let _ = graph.add_node(terminal(4));
        // Import landed = 13 + 3 + 3 = 19 = route landed.
        let _ = graph.add_edge(road(3, 4, 3, dec!(3)));
        let pf = Pathfinder::from_graph(&graph);
        let quote = pf.find_cheapest_supply(&graph, n(3), &pricing(dec!(13)));
        assert!(matches!(quote, SupplyQuote::Import(i) if i.landed_cost == dec!(19)));
    }

    #[test]
    fn cheaper_import_beats_route() {
        let mut graph = chain();
        let _ = graph.add_node(terminal(4));
        let _ = graph.add_edge(road(3, 4, 3, dec!(1)));
        let pf = Pathfinder::from_graph(&graph);
        let quote = pf.find_cheapest_supply(&graph, n(3), &pricing(dec!(10)));
        assert_eq!(quote.landed_cost(), Some(dec!(14)));
        assert!(matches!(quote, SupplyQuote::Import(_)));
    }

    #[test]
    fn exhausted_refinery_is_skipped() {
        let mut graph = chain();
        if let Some(site) = graph.node_mut(n(2)).and_then(|node| node.processing.as_mut()) {
            site.throughput = dec!(100);
        }
        let pf = Pathfinder::from_graph(&graph);
        assert_eq!(
            pf.find_cheapest_supply(&graph, n(3), &pricing(dec!(80))),
            SupplyQuote::Unsupplied
        );
    }

    #[test]
    fn inactive_well_is_ignored() {
        let mut graph = chain();
        if let Some(site) = graph.node_mut(n(1)).and_then(|node| node.production.as_mut()) {
            site.owner = None;
        }
        let pf = Pathfinder::from_graph(&graph);
        assert!(pf.cheapest_route(&graph, n(3)).is_none());
    }

    #[test]
    fn isolated_consumer_is_unsupplied() {
        let mut graph = chain();
        let _ = graph.add_node(town(9, dec!(20)));
        let _ = graph.add_node(terminal(4));
        let _ = graph.add_edge(road(3, 4, 3, dec!(1)));
        let pf = Pathfinder::from_graph(&graph);
        assert_eq!(
            pf.find_cheapest_supply(&graph, n(9), &pricing(dec!(50))),
            SupplyQuote::Unsupplied
        );
    }

    #[test]
    fn picks_cheapest_pair_among_many() {
        let graph = GraphModel::from_parts(
            vec![
                well(1, dec!(100), dec!(10)),
                well(2, dec!(100), dec!(6)),
                refinery(3, dec!(100), dec!(2), dec!(5)),
                refinery(4, dec!(100), dec!(1), dec!(1)),
                town(5, dec!(50)),
            ],
            vec![
                road(1, 1, 3, dec!(1)),
                road(2, 2, 3, dec!(4)),
                road(3, 2, 4, dec!(6)),
                road(4, 3, 5, dec!(1)),
                road(5, 4, 5, dec!(1)),
            ],
        )
        .unwrap_or_default();
        let pf = Pathfinder::from_graph(&graph);
        let route = pf.cheapest_route(&graph, n(5));
        // Well 1 via refinery 3: 10+1+2+5+1 = 19
        // Well 2 via refinery 3: 6+4+2+5+1 = 18
        // Well 2 via refinery 4: 6+6+1+1+1 = 15
        // Well 1 via refinery 4: 10+(1+1+1)+1+1+1 = 16
        assert_eq!(route.map(|r| (r.production, r.processing)), Some((n(2), n(4))));
        assert_eq!(route.map(|r| r.landed_cost), Some(dec!(15)));
    }

    #[test]
    fn export_prefers_best_netback() {
        let mut graph = chain();
        let _ = graph.add_node(terminal(4));
        let _ = graph.add_node(terminal(5));
        let _ = graph.add_edge(road(3, 1, 4, dec!(8)));
        let _ = graph.add_edge(road(4, 1, 5, dec!(2)));
        let pf = Pathfinder::from_graph(&graph);
        let quote = pf.best_export(&graph, n(1), dec!(40), dec!(3));
        assert_eq!(quote.map(|q| q.terminal), Some(n(5)));
        assert_eq!(quote.map(|q| q.netback), Some(dec!(35)));
    }

    #[test]
    fn terminal_fee_override_applies() {
        let mut graph = chain();
        let mut t = terminal(4);
        t.terminal = Some(TerminalSite {
            fee_override: Some(dec!(0)),
        });
        let _ = graph.add_node(t);
        let _ = graph.add_edge(road(3, 4, 3, dec!(2)));
        let pf = Pathfinder::from_graph(&graph);
        let quote = pf.nearest_import(&graph, n(3), &pricing(dec!(10)));
        assert_eq!(quote.map(|q| q.landed_cost), Some(dec!(12)));
    }
}
