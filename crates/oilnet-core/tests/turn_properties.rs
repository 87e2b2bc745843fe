//! Cross-module properties of the pathfinder and the turn resolver.
//!
//! Every game here runs with [`NoJitter`] unless the test is about seeded
//! replay, so expected figures can be written down exactly.

// Panicking on failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::too_many_lines
)]

use oilnet_core::config::GameConfig;
use oilnet_core::game::GameState;
use oilnet_core::random::NoJitter;
use oilnet_core::turn::TurnError;
use oilnet_types::{
    ConsumptionSite, Edge, EdgeId, Node, NodeId, NodeRole, PlayerId, ProcessingSite,
    ProductionSite,
};
use oilnet_world::{
    GraphModel, Pathfinder, SAMPLE_MAP_IDS, SupplyPricing, SupplyQuote, create_sample_map,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn n(id: u32) -> NodeId {
    NodeId::new(id)
}

fn sample_graph() -> GraphModel {
    create_sample_map().unwrap().0
}

fn sample_game(turns: u64) -> GameState {
    let mut config = GameConfig::default();
    config.game.turn_limit = turns;
    GameState::with_random(config, sample_graph(), Box::new(NoJitter)).unwrap()
}

/// Both players build a full chain on the sample map.
fn contested_game(turns: u64) -> GameState {
    let ids = SAMPLE_MAP_IDS;
    let mut state = sample_game(turns);
    state.build_well(ALICE, ids.northfield).unwrap();
    state.build_refinery(ALICE, ids.junction).unwrap();
    state.build_well(BOB, ids.sandhill).unwrap();
    state.build_well(BOB, ids.eastbasin).unwrap();
    state.build_refinery(BOB, ids.riverside).unwrap();
    state
}

fn well(id: u32, capacity: Decimal, cost: Decimal) -> Node {
    let mut node = Node::new(n(id), "P");
    node.production = Some(ProductionSite {
        capacity,
        operating_cost: cost,
        construction_cost: dec!(1000),
        owner: None,
        extracted: Decimal::ZERO,
    });
    node
}

fn refinery(id: u32, capacity: Decimal, cost: Decimal) -> Node {
    let mut node = Node::new(n(id), "R");
    node.processing = Some(ProcessingSite {
        base_capacity: capacity,
        operating_cost: cost,
        fee: Decimal::ZERO,
        owner: None,
        level: 0,
        throughput: Decimal::ZERO,
    });
    node
}

fn town(id: u32, base: Decimal) -> Node {
    let mut node = Node::new(n(id), "D");
    node.consumption = Some(ConsumptionSite {
        base_demand: base,
        growth_rate: Decimal::ZERO,
        demand: Decimal::ZERO,
        local_price: None,
        served: Decimal::ZERO,
        imported: Decimal::ZERO,
    });
    node
}

fn all_costs(pathfinder: &Pathfinder, ids: &[NodeId]) -> Vec<Option<Decimal>> {
    ids.iter()
        .flat_map(|&a| ids.iter().map(move |&b| pathfinder.shortest_cost(a, b)))
        .collect()
}

// ---------------------------------------------------------------------------
// Pathfinder properties
// ---------------------------------------------------------------------------

#[test]
fn distances_are_a_metric() {
    let graph = sample_graph();
    let pathfinder = Pathfinder::from_graph(&graph);
    let ids = graph.node_ids();

    for &i in &ids {
        assert_eq!(pathfinder.shortest_cost(i, i), Some(Decimal::ZERO));
        for &j in &ids {
            let ij = pathfinder.shortest_cost(i, j);
            assert_eq!(ij, pathfinder.shortest_cost(j, i), "symmetry {i} {j}");
            for &k in &ids {
                let (Some(ij), Some(jk), Some(ik)) = (
                    ij,
                    pathfinder.shortest_cost(j, k),
                    pathfinder.shortest_cost(i, k),
                ) else {
                    continue;
                };
                assert!(ik <= ij + jk, "triangle {i} {j} {k}");
            }
        }
    }
}

#[test]
fn pipelines_and_fee_cuts_never_raise_costs() {
    let mut state = sample_game(1);
    let ids = state.graph.node_ids();
    let before = all_costs(&state.pathfinder, &ids);

    state.build_pipeline(ALICE, EdgeId::new(4)).unwrap();
    let with_pipeline = all_costs(&state.pathfinder, &ids);
    for (old, new) in before.iter().zip(&with_pipeline) {
        assert!(new.unwrap() <= old.unwrap());
    }

    state
        .set_pipeline_fee(ALICE, EdgeId::new(4), Decimal::ZERO)
        .unwrap();
    let with_cut = all_costs(&state.pathfinder, &ids);
    for (old, new) in with_pipeline.iter().zip(&with_cut) {
        assert!(new.unwrap() <= old.unwrap());
    }
    assert!(with_cut != before);
}

#[test]
fn laying_every_pipeline_never_raises_a_cost() {
    let mut config = GameConfig::default();
    config.game.starting_cash = dec!(10000000);
    let mut state = GameState::with_random(config, sample_graph(), Box::new(NoJitter)).unwrap();
    let ids = state.graph.node_ids();
    let edges: Vec<EdgeId> = state.graph.edges().map(|e| e.id).collect();
    assert_eq!(edges.len(), state.graph.edge_count());

    let first = all_costs(&state.pathfinder, &ids);
    let mut previous = first.clone();
    for edge in edges {
        state.build_pipeline(ALICE, edge).unwrap();
        let built = all_costs(&state.pathfinder, &ids);
        for (old, new) in previous.iter().zip(&built) {
            assert!(new.unwrap() <= old.unwrap(), "pipeline on {edge}");
        }

        state.set_pipeline_fee(ALICE, edge, Decimal::ZERO).unwrap();
        let cut = all_costs(&state.pathfinder, &ids);
        for (old, new) in built.iter().zip(&cut) {
            assert!(new.unwrap() <= old.unwrap(), "fee cut on {edge}");
        }
        previous = cut;
    }

    // With every edge free, every connected pair costs nothing.
    assert!(previous.iter().all(|c| *c == Some(Decimal::ZERO)));
    assert!(previous != first);
}

#[test]
fn rebuild_is_idempotent() {
    let state = contested_game(1);
    let mut again = state.pathfinder.clone();
    again.rebuild(&state.graph);
    assert_eq!(again, state.pathfinder);
    again.rebuild(&state.graph);
    assert_eq!(again, state.pathfinder);
}

#[test]
fn supply_never_costs_more_than_import() {
    let state = contested_game(1);
    let pricing = SupplyPricing {
        refined_price: state.market.refined_price,
        terminal_fee: state.market.terminal_fee,
    };
    for consumer in state.graph.nodes_with_role(NodeRole::Consumption) {
        let import = state
            .pathfinder
            .nearest_import(&state.graph, consumer, &pricing)
            .unwrap();
        let quote = state
            .pathfinder
            .find_cheapest_supply(&state.graph, consumer, &pricing);
        assert!(quote.landed_cost().unwrap() <= import.landed_cost);
    }
}

// ---------------------------------------------------------------------------
// Turn properties
// ---------------------------------------------------------------------------

#[test]
fn settled_barrels_respect_capacity() {
    let mut state = contested_game(5);
    for _ in 0..5 {
        let summary = state.advance_turn().unwrap();

        let mut throughput = Decimal::ZERO;
        for node in state.graph.nodes() {
            if let Some(site) = &node.production {
                assert!(site.extracted <= site.capacity, "well {}", node.id);
            }
            if let Some(site) = &node.processing {
                assert!(site.throughput <= site.capacity(), "refinery {}", node.id);
                throughput += site.throughput;
            }
        }
        assert_eq!(throughput, summary.served);
        assert_eq!(
            summary.served + summary.imported + summary.unmet,
            summary.demand
        );
    }
}

#[test]
fn profit_identity_holds_every_turn() {
    let mut state = contested_game(6);
    while !state.is_game_over() {
        let summary = state.advance_turn().unwrap();
        for player in state.players.values() {
            assert_eq!(player.turn_profit, player.turn_revenue - player.turn_cost);
            assert_eq!(summary.profits.get(&player.id), Some(&player.turn_profit));
            let total: Decimal = player.profit_history.iter().copied().sum();
            assert_eq!(player.cumulative_profit, total);
        }
        assert!(summary.reconciliation.is_balanced());
    }
}

#[test]
fn market_shares_sum_to_one_or_zero() {
    let mut state = contested_game(3);
    state.advance_turn().unwrap();
    let total: Decimal = state.players.values().map(|p| p.market_share).sum();
    assert_eq!(total, Decimal::ONE);

    let mut idle = sample_game(1);
    idle.advance_turn().unwrap();
    let total: Decimal = idle.players.values().map(|p| p.market_share).sum();
    assert_eq!(total, Decimal::ZERO);
}

#[test]
fn shares_with_three_way_split_still_sum_to_one() {
    // Three refineries serve equal volumes, so each share is 1/3.
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for i in 0_u32..3 {
        let offset = i * 3;
        nodes.push(well(offset, dec!(10), dec!(1)));
        nodes.push(refinery(offset + 1, dec!(10), dec!(1)));
        nodes.push(town(offset + 2, dec!(10)));
        edges.push(Edge::road(EdgeId::new(offset), n(offset), n(offset + 1), dec!(1)));
        edges.push(Edge::road(
            EdgeId::new(offset + 1),
            n(offset + 1),
            n(offset + 2),
            dec!(1),
        ));
    }
    let graph = GraphModel::from_parts(nodes, edges).unwrap();
    let mut config = GameConfig::default();
    config.game.players = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];
    config.market.elasticity = Decimal::ZERO;
    let mut state = GameState::with_random(config, graph, Box::new(NoJitter)).unwrap();
    for i in 0_u32..3 {
        let player = PlayerId::new(i + 1);
        state.build_well(player, n(i * 3)).unwrap();
        state.build_refinery(player, n(i * 3 + 1)).unwrap();
    }

    state.advance_turn().unwrap();
    let total: Decimal = state.players.values().map(|p| p.market_share).sum();
    assert_eq!(total, Decimal::ONE);
    assert!(state.players.values().all(|p| p.market_share > dec!(0.33)));
}

#[test]
fn three_node_chain_scenario() {
    let graph = GraphModel::from_parts(
        vec![
            well(0, dec!(100), dec!(10)),
            refinery(1, dec!(100), dec!(2)),
            town(2, dec!(50)),
        ],
        vec![
            Edge::road(EdgeId::new(0), n(0), n(1), dec!(1)),
            Edge::road(EdgeId::new(1), n(1), n(2), dec!(1)),
        ],
    )
    .unwrap();
    let mut config = GameConfig::default();
    config.market.elasticity = Decimal::ZERO;
    let mut state = GameState::with_random(config, graph, Box::new(NoJitter)).unwrap();
    state.build_well(ALICE, n(0)).unwrap();
    state.build_refinery(BOB, n(1)).unwrap();
    state.set_processing_fee(BOB, n(1), dec!(5)).unwrap();

    let summary = state.advance_turn().unwrap();
    assert_eq!(summary.served, dec!(50));
    assert_eq!(summary.imported, Decimal::ZERO);

    let delivery = summary.deliveries.first().unwrap();
    assert_eq!(delivery.crude_price, dec!(11));
    let sale = state
        .node_snapshot(n(2))
        .and_then(|node| node.consumption)
        .and_then(|site| site.local_price)
        .unwrap();
    assert_eq!(sale, dec!(19));

    let bob = state.player_summary(BOB).unwrap();
    let bob_player = state.players.get(&BOB).unwrap();
    assert_eq!(bob_player.turn_revenue, dec!(50) * (sale - dec!(11)));
    assert_eq!(bob.market_share, Decimal::ONE);
    let alice = state.players.get(&ALICE).unwrap();
    assert_eq!(alice.turn_revenue, dec!(50) * dec!(11));
}

#[test]
fn isolated_component_goes_unmet() {
    // Component {0, 1} has a terminal; town 2 sits alone.
    let mut port = Node::new(n(0), "Port");
    port.terminal = Some(oilnet_types::TerminalSite::default());
    let graph = GraphModel::from_parts(
        vec![port, town(1, dec!(20)), town(2, dec!(30))],
        vec![Edge::road(EdgeId::new(0), n(0), n(1), dec!(2))],
    )
    .unwrap();
    let mut state =
        GameState::with_random(GameConfig::default(), graph, Box::new(NoJitter)).unwrap();

    assert_eq!(state.pathfinder.shortest_cost(n(0), n(2)), None);
    assert!(!state.pathfinder.is_reachable(n(2), n(1)));
    let pricing = SupplyPricing {
        refined_price: state.market.refined_price,
        terminal_fee: state.market.terminal_fee,
    };
    assert_eq!(
        state
            .pathfinder
            .find_cheapest_supply(&state.graph, n(2), &pricing),
        SupplyQuote::Unsupplied
    );

    let summary = state.advance_turn().unwrap();
    assert_eq!(summary.served, Decimal::ZERO);
    assert_eq!(summary.unmet, dec!(30));
    assert!(summary.imported > Decimal::ZERO);
}

#[test]
fn same_seed_replays_identically() {
    fn play(seed: u64) -> Vec<oilnet_types::TurnSnapshot> {
        let mut config = GameConfig::default();
        config.game.seed = seed;
        config.game.turn_limit = 8;
        let mut state = GameState::new(config, sample_graph()).unwrap();
        state.build_well(ALICE, SAMPLE_MAP_IDS.northfield).unwrap();
        state.build_refinery(BOB, SAMPLE_MAP_IDS.junction).unwrap();
        while !state.is_game_over() {
            state.advance_turn().unwrap();
        }
        state.history().to_vec()
    }

    assert_eq!(play(7), play(7));
    assert_ne!(play(7), play(8));
}

#[test]
fn advancing_past_the_limit_is_an_error() {
    let mut state = contested_game(1);
    state.advance_turn().unwrap();
    assert!(state.is_game_over());
    let ledger_len = state.ledger.len();
    assert!(matches!(
        state.advance_turn(),
        Err(TurnError::GameOver { turn_limit: 1 })
    ));
    assert_eq!(state.ledger.len(), ledger_len);
    assert_eq!(state.turn(), 1);
}
