//! Turn resolver: the fixed nine-phase cycle run once per turn.
//!
//! 1. **Reset** -- zero per-turn accumulators on players, sites and edges.
//! 2. **Price update** -- bounded random walk of crude and refined prices;
//!    refined is kept at or above crude.
//! 3. **Production** -- every active well offers its rated capacity and its
//!    owner pays lifting cost on that full capacity.
//! 4. **Demand update** -- each consumer's local price is the landed cost
//!    of its cheapest supply; elastic demand follows from it. That price
//!    is the node's single sale price for the rest of the turn.
//! 5. **Routing** -- consumers are supplied in node order from their
//!    cheapest option, re-querying after each clipped route, and every
//!    settled barrel is sold at the local price and paid for through the
//!    ledger. Optionally, unsold well capacity is exported afterwards.
//! 6. **Growth update** -- base demand compounds by its growth rate plus
//!    jitter on the rate.
//! 7. **Profit settlement** -- `profit = revenue - cost` into cash,
//!    cumulative profit and history.
//! 8. **Market share** -- refined barrels delivered per player over the
//!    total.
//! 9. **Persist and advance** -- reconcile the ledger, append the turn
//!    snapshot, advance the clock.
//!
//! Phases never branch or skip. Given the same state and random source, a
//! turn resolves identically.

use std::collections::BTreeMap;

use oilnet_ledger::{Ledger, LedgerError, ReconcileResult};
use oilnet_types::{LedgerEntry, NodeId, NodeRole, PlayerId, PlayerTurnRecord, TurnSnapshot};
use oilnet_world::{DetailedRoute, RouteQuote, SupplyPricing, SupplyQuote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::ClockError;
use crate::game::GameState;
use crate::market::{elastic_demand, grow_demand, update_prices};

/// Errors that can occur while resolving a turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The turn limit has been reached.
    #[error("game over after {turn_limit} turns")]
    GameOver {
        /// Configured game length.
        turn_limit: u64,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A settlement could not be recorded.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

/// Barrels delivered along one well -> refinery -> consumer chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Consumer supplied.
    pub consumer: NodeId,
    /// Well the crude came from.
    pub production: NodeId,
    /// Refinery that processed it.
    pub processing: NodeId,
    /// Barrels delivered.
    pub barrels: Decimal,
    /// Per-barrel cost of the chain at settlement time.
    pub landed_cost: Decimal,
    /// Per-barrel price paid at the consumer: its posted local price.
    pub sale_price: Decimal,
    /// Per-barrel price paid to the well owner.
    pub crude_price: Decimal,
}

/// Summary of a single turn's resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn that was resolved (first turn is 1).
    pub turn: u64,
    /// Crude price after the price walk.
    pub crude_price: Decimal,
    /// Refined price after the price walk.
    pub refined_price: Decimal,
    /// Rated capacity of all active wells.
    pub production: Decimal,
    /// Elastic demand over all consumers.
    pub demand: Decimal,
    /// Barrels delivered through player chains.
    pub served: Decimal,
    /// Barrels imported through terminals.
    pub imported: Decimal,
    /// Surplus crude exported through terminals.
    pub exported: Decimal,
    /// Demand nobody could supply.
    pub unmet: Decimal,
    /// Every settled chain, in settlement order.
    pub deliveries: Vec<Delivery>,
    /// Settled profit per player.
    pub profits: BTreeMap<PlayerId, Decimal>,
    /// Ledger check against player accumulators.
    pub reconciliation: ReconcileResult,
}

/// What the routing phase moved.
#[derive(Debug, Default)]
struct RoutingResult {
    deliveries: Vec<Delivery>,
    served: Decimal,
    imported: Decimal,
    unmet: Decimal,
}

impl GameState {
    /// Resolve one turn. See [`advance_turn`].
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::GameOver`] once the turn limit is reached.
    pub fn advance_turn(&mut self) -> Result<TurnSummary, TurnError> {
        advance_turn(self)
    }
}

/// Resolve one turn, running all nine phases in order.
///
/// # Errors
///
/// Returns [`TurnError::GameOver`] if the game has already ended; the state
/// is untouched in that case.
pub fn advance_turn(state: &mut GameState) -> Result<TurnSummary, TurnError> {
    if state.clock.is_over() {
        return Err(TurnError::GameOver {
            turn_limit: state.clock.turn_limit(),
        });
    }
    let turn = state.clock.current();
    debug!(turn, "Turn started");

    // --- Phase 1: Reset ---
    phase_reset(state);

    // --- Phase 2: Price update ---
    phase_price_update(state);

    // --- Phase 3: Production ---
    let production = phase_production(state, turn)?;

    // --- Phase 4: Demand update ---
    let demand = phase_demand_update(state);

    // --- Phase 5: Routing ---
    let routing = phase_routing(state, turn)?;
    let exported = if state.config.market.export_surplus {
        phase_export(state, turn)?
    } else {
        Decimal::ZERO
    };

    // --- Phase 6: Growth update ---
    phase_growth_update(state);

    // --- Phase 7: Profit settlement ---
    let profits = phase_profit_settlement(state);

    // --- Phase 8: Market share ---
    phase_market_share(state);

    // --- Phase 9: Persist and advance ---
    let reconciliation = state.ledger.reconcile(turn, state.players.values());
    if let ReconcileResult::Anomaly(anomaly) = &reconciliation {
        warn!(turn, %anomaly, "Ledger reconciliation failed");
    }
    phase_persist(state, turn)?;

    let summary = TurnSummary {
        turn,
        crude_price: state.market.crude_price,
        refined_price: state.market.refined_price,
        production,
        demand,
        served: routing.served,
        imported: routing.imported,
        exported,
        unmet: routing.unmet,
        deliveries: routing.deliveries,
        profits,
        reconciliation,
    };

    info!(
        turn,
        crude = %summary.crude_price,
        refined = %summary.refined_price,
        demand = %summary.demand,
        served = %summary.served,
        imported = %summary.imported,
        unmet = %summary.unmet,
        "Turn resolved"
    );

    state.last_summary = Some(summary.clone());
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

fn phase_reset(state: &mut GameState) {
    for player in state.players.values_mut() {
        player.reset_turn();
    }
    state.graph.reset_turn_counters();
}

fn phase_price_update(state: &mut GameState) {
    update_prices(&mut state.market, &state.config.market, state.rng.as_mut());
    debug!(
        crude = %state.market.crude_price,
        refined = %state.market.refined_price,
        "Prices updated"
    );
}

/// Charge lifting cost on rated capacity. Returns total rated capacity.
fn phase_production(state: &mut GameState, turn: u64) -> Result<Decimal, TurnError> {
    let wells: Vec<(NodeId, PlayerId, Decimal, Decimal)> = state
        .graph
        .nodes()
        .filter_map(|n| {
            let site = n.production.as_ref()?;
            Some((n.id, site.owner?, site.capacity, site.operating_cost))
        })
        .collect();

    let mut total = Decimal::ZERO;
    for (node, owner, capacity, operating_cost) in wells {
        total = total.saturating_add(capacity);
        let cost = operating_cost.saturating_mul(capacity);
        settle(state, turn, owner, cost, |ledger| {
            ledger.record_operating_cost(turn, owner, cost, "LIFTING", node)
        })?;
    }
    debug!(turn, production = %total, "Production phase");
    Ok(total)
}

/// Post local prices and derive elastic demand. Returns total demand.
fn phase_demand_update(state: &mut GameState) -> Decimal {
    let pricing = pricing(state);
    let consumers = state.graph.nodes_with_role(NodeRole::Consumption);
    let quotes: Vec<(NodeId, Option<Decimal>)> = consumers
        .into_iter()
        .map(|id| {
            let quote = state.pathfinder.find_cheapest_supply(&state.graph, id, &pricing);
            (id, quote.landed_cost())
        })
        .collect();

    let reference = state.market.reference_price;
    let elasticity = state.market.elasticity;
    let mut total = Decimal::ZERO;
    for (id, price) in quotes {
        let Some(site) = state.graph.node_mut(id).and_then(|n| n.consumption.as_mut()) else {
            continue;
        };
        site.local_price = price;
        site.demand = price.map_or(site.base_demand, |p| {
            elastic_demand(site.base_demand, reference, p, elasticity)
        });
        total = total.saturating_add(site.demand);
    }
    debug!(demand = %total, "Demand updated");
    total
}

/// Supply every consumer with positive demand, in node order.
fn phase_routing(state: &mut GameState, turn: u64) -> Result<RoutingResult, TurnError> {
    let pricing = pricing(state);
    let mut result = RoutingResult::default();

    for consumer in state.graph.nodes_with_role(NodeRole::Consumption) {
        let Some((demand, local_price)) = state
            .graph
            .node(consumer)
            .and_then(|n| n.consumption.as_ref())
            .map(|c| (c.demand, c.local_price))
        else {
            continue;
        };
        let mut remaining = demand;

        // A node with no posted price had no supply at all in phase 4, and
        // capacity only shrinks from there.
        while let Some(sale_price) = local_price
            && remaining > Decimal::ZERO
        {
            match state
                .pathfinder
                .find_cheapest_supply(&state.graph, consumer, &pricing)
            {
                SupplyQuote::Import(_) => {
                    if let Some(site) = consumer_site(state, consumer) {
                        site.imported = site.imported.saturating_add(remaining);
                    }
                    result.imported = result.imported.saturating_add(remaining);
                    remaining = Decimal::ZERO;
                }
                SupplyQuote::Route(quote) => {
                    let barrels = remaining.min(quote.available);
                    if barrels <= Decimal::ZERO {
                        break;
                    }
                    settle_route(state, turn, &quote, barrels, sale_price)?;
                    if let Some(site) = consumer_site(state, consumer) {
                        site.served = site.served.saturating_add(barrels);
                    }
                    result.served = result.served.saturating_add(barrels);
                    result.deliveries.push(Delivery {
                        consumer,
                        production: quote.production,
                        processing: quote.processing,
                        barrels,
                        landed_cost: quote.landed_cost,
                        sale_price,
                        crude_price: quote.crude_price,
                    });
                    remaining = remaining.saturating_sub(barrels);
                }
                SupplyQuote::Unsupplied => break,
            }
        }

        if remaining > Decimal::ZERO {
            warn!(turn, node = %consumer, unmet = %remaining, "Demand left unmet");
            result.unmet = result.unmet.saturating_add(remaining);
        }
    }

    debug!(
        turn,
        served = %result.served,
        imported = %result.imported,
        unmet = %result.unmet,
        "Routing phase"
    );
    Ok(result)
}

/// Export unsold well capacity at the best positive netback.
/// Returns barrels exported.
fn phase_export(state: &mut GameState, turn: u64) -> Result<Decimal, TurnError> {
    let crude_price = state.market.crude_price;
    let default_fee = state.market.terminal_fee;
    let surplus: Vec<(NodeId, PlayerId, Decimal)> = state
        .graph
        .nodes()
        .filter_map(|n| {
            let site = n.production.as_ref()?;
            let remaining = site.remaining();
            (remaining > Decimal::ZERO).then_some((n.id, site.owner?, remaining))
        })
        .collect();

    let mut exported = Decimal::ZERO;
    for (well, owner, barrels) in surplus {
        let Some(quote) = state
            .pathfinder
            .best_export(&state.graph, well, crude_price, default_fee)
        else {
            continue;
        };
        if quote.netback <= Decimal::ZERO {
            continue;
        }
        let proceeds = quote.netback.saturating_mul(barrels);
        settle(state, turn, owner, proceeds, |ledger| {
            ledger.record_export(turn, owner, proceeds, well)
        })?;
        if let Some(site) = state.graph.node_mut(well).and_then(|n| n.production.as_mut()) {
            site.extracted = site.extracted.saturating_add(barrels);
        }
        if let Some(route) = state.pathfinder.detailed_route(well, quote.terminal) {
            settle_transport(state, turn, &route, barrels)?;
        }
        exported = exported.saturating_add(barrels);
        debug!(
            turn,
            node = %well,
            terminal = %quote.terminal,
            barrels = %barrels,
            "Crude exported"
        );
    }
    Ok(exported)
}

fn phase_growth_update(state: &mut GameState) {
    let amplitude = state.config.market.demand_jitter;
    for node in state.graph.nodes_mut() {
        let Some(site) = node.consumption.as_mut() else {
            continue;
        };
        let jitter = state.rng.jitter(amplitude);
        site.base_demand = grow_demand(site.base_demand, site.growth_rate, jitter);
    }
}

fn phase_profit_settlement(state: &mut GameState) -> BTreeMap<PlayerId, Decimal> {
    let mut profits = BTreeMap::new();
    for player in state.players.values_mut() {
        let profit = player.turn_revenue.saturating_sub(player.turn_cost);
        player.turn_profit = profit;
        player.cash = player.cash.saturating_add(profit);
        player.cumulative_profit = player.cumulative_profit.saturating_add(profit);
        player.profit_history.push(profit);
        profits.insert(player.id, profit);
    }
    profits
}

/// Shares are `sold / total`. Division residue goes to the largest seller
/// (lowest id on ties) so that shares sum to exactly one.
fn phase_market_share(state: &mut GameState) {
    let total = state
        .players
        .values()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.barrels_sold));
    if total <= Decimal::ZERO {
        for player in state.players.values_mut() {
            player.market_share = Decimal::ZERO;
        }
        return;
    }

    let mut assigned = Decimal::ZERO;
    let mut leader: Option<(PlayerId, Decimal)> = None;
    for player in state.players.values_mut() {
        player.market_share = player.barrels_sold.checked_div(total).unwrap_or_default();
        assigned = assigned.saturating_add(player.market_share);
        if leader.is_none_or(|(_, sold)| player.barrels_sold > sold) {
            leader = Some((player.id, player.barrels_sold));
        }
    }
    let residue = Decimal::ONE.saturating_sub(assigned);
    if let Some((id, _)) = leader
        && let Some(player) = state.players.get_mut(&id)
    {
        player.market_share = player.market_share.saturating_add(residue);
    }
}

fn phase_persist(state: &mut GameState, turn: u64) -> Result<(), TurnError> {
    let players = state
        .players
        .values()
        .map(|p| PlayerTurnRecord {
            player: p.id,
            cash: p.cash,
            profit: p.turn_profit,
            cumulative_profit: p.cumulative_profit,
        })
        .collect();
    state.history.push(TurnSnapshot {
        turn,
        crude_price: state.market.crude_price,
        refined_price: state.market.refined_price,
        players,
    });
    state.clock.advance()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Settlement helpers
// ---------------------------------------------------------------------------

fn pricing(state: &GameState) -> SupplyPricing {
    SupplyPricing {
        refined_price: state.market.refined_price,
        terminal_fee: state.market.terminal_fee,
    }
}

fn consumer_site(
    state: &mut GameState,
    node: NodeId,
) -> Option<&mut oilnet_types::ConsumptionSite> {
    state.graph.node_mut(node).and_then(|n| n.consumption.as_mut())
}

/// Record one movement through `record` and apply it to the player's
/// accumulators according to the recorded entry type.
///
/// Zero amounts are skipped: the ledger only holds real movements.
fn settle<F>(
    state: &mut GameState,
    turn: u64,
    player: PlayerId,
    amount: Decimal,
    record: F,
) -> Result<(), TurnError>
where
    F: FnOnce(&mut Ledger) -> Result<&LedgerEntry, LedgerError>,
{
    if amount <= Decimal::ZERO {
        return Ok(());
    }
    let Some(account) = state.players.get_mut(&player) else {
        warn!(turn, %player, %amount, "Settlement for unknown player skipped");
        return Ok(());
    };
    let entry_type = record(&mut state.ledger)?.entry_type;
    if entry_type.is_income() {
        account.earn(amount);
    } else {
        account.charge(amount);
    }
    Ok(())
}

/// Settle `barrels` along a priced chain, sold at `sale_price`.
///
/// - well owner earns the transport-adjusted crude price
/// - refinery owner earns `sale - crude` and pays operating cost plus fee;
///   a sale price below crude is charged to it as a shortfall
/// - pipeline owners on both legs earn their fee
fn settle_route(
    state: &mut GameState,
    turn: u64,
    quote: &RouteQuote,
    barrels: Decimal,
    sale_price: Decimal,
) -> Result<(), TurnError> {
    let well_owner = state
        .graph
        .node_mut(quote.production)
        .and_then(|n| n.production.as_mut())
        .and_then(|site| {
            site.extracted = site.extracted.saturating_add(barrels);
            site.owner
        });
    let refinery_owner = state
        .graph
        .node_mut(quote.processing)
        .and_then(|n| n.processing.as_mut())
        .and_then(|site| {
            site.throughput = site.throughput.saturating_add(barrels);
            site.owner
        });

    if let Some(owner) = well_owner {
        let revenue = quote.crude_price.saturating_mul(barrels);
        settle(state, turn, owner, revenue, |ledger| {
            ledger.record_sale(turn, owner, revenue, "CRUDE_SALE", quote.production)
        })?;
    }

    if let Some(owner) = refinery_owner {
        let refinery = quote.processing;
        let revenue = sale_price
            .saturating_sub(quote.crude_price)
            .saturating_mul(barrels);
        settle(state, turn, owner, revenue, |ledger| {
            ledger.record_sale(turn, owner, revenue, "REFINED_SALE", refinery)
        })?;
        let shortfall = quote
            .crude_price
            .saturating_sub(sale_price)
            .saturating_mul(barrels);
        settle(state, turn, owner, shortfall, |ledger| {
            ledger.record_operating_cost(turn, owner, shortfall, "REFINED_SHORTFALL", refinery)
        })?;
        let operating = quote.processing_cost.saturating_mul(barrels);
        settle(state, turn, owner, operating, |ledger| {
            ledger.record_operating_cost(turn, owner, operating, "REFINING", refinery)
        })?;
        let fee = quote.processing_fee.saturating_mul(barrels);
        settle(state, turn, owner, fee, |ledger| {
            ledger.record_processing_fee(turn, owner, fee, refinery)
        })?;
        if let Some(account) = state.players.get_mut(&owner) {
            account.barrels_sold = account.barrels_sold.saturating_add(barrels);
        }
    }

    for (from, to) in [
        (quote.production, quote.processing),
        (quote.processing, quote.consumer),
    ] {
        if let Some(route) = state.pathfinder.detailed_route(from, to) {
            settle_transport(state, turn, &route, barrels)?;
        }
    }
    Ok(())
}

/// Count flow on every traversed edge and pay pipeline owners their fee.
fn settle_transport(
    state: &mut GameState,
    turn: u64,
    route: &DetailedRoute,
    barrels: Decimal,
) -> Result<(), TurnError> {
    for segment in &route.segments {
        if let Some(edge) = state.graph.edge_mut(segment.edge) {
            edge.flow = edge.flow.saturating_add(barrels);
            if segment.pipeline_owner.is_some()
                && let Some(link) = edge.pipeline.as_mut()
            {
                link.flow = link.flow.saturating_add(barrels);
            }
        }
        if let Some(owner) = segment.pipeline_owner {
            let fee = segment.cost.saturating_mul(barrels);
            let edge = segment.edge;
            settle(state, turn, owner, fee, |ledger| {
                ledger.record_transport_fee(turn, owner, fee, edge)
            })?;
        }
    }
    Ok(())
}
