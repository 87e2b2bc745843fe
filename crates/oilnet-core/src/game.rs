//! The game context: every piece of mutable state in one value.
//!
//! A [`GameState`] is passed by `&mut` into the Mutation API and the turn
//! resolver; there is no ambient global state. External readers should
//! only observe it between completed turns.

use std::collections::BTreeMap;

use oilnet_ledger::Ledger;
use oilnet_types::{MarketState, Player, PlayerId, TurnSnapshot};
use oilnet_world::{GraphModel, Pathfinder};
use rust_decimal::Decimal;
use tracing::info;

use crate::clock::{ClockError, TurnClock};
use crate::config::{ConfigError, GameConfig};
use crate::market::opening_market;
use crate::random::{RandomSource, SeededRandom};
use crate::turn::TurnSummary;

/// Errors that can occur when setting up a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The turn clock could not be created.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// All state of a running game.
#[derive(Debug)]
pub struct GameState {
    /// Configuration the game was started with.
    pub config: GameConfig,
    /// Completed-turn counter.
    pub clock: TurnClock,
    /// Transport graph with ownership and per-turn counters.
    pub graph: GraphModel,
    /// Routing oracle, rebuilt after every successful command.
    pub pathfinder: Pathfinder,
    /// Players keyed by id.
    pub players: BTreeMap<PlayerId, Player>,
    /// Global prices and demand parameters.
    pub market: MarketState,
    /// Every cash movement of the game.
    pub ledger: Ledger,
    /// One snapshot per completed turn.
    pub history: Vec<TurnSnapshot>,
    /// Summary of the most recent turn.
    pub last_summary: Option<TurnSummary>,
    /// Noise for the price walk and demand growth.
    pub rng: Box<dyn RandomSource + Send>,
}

impl GameState {
    /// Start a game seeded from `config.game.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the configuration is invalid.
    pub fn new(config: GameConfig, graph: GraphModel) -> Result<Self, GameError> {
        let rng = Box::new(SeededRandom::new(config.game.seed));
        Self::with_random(config, graph, rng)
    }

    /// Start a game with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the configuration is invalid.
    pub fn with_random(
        config: GameConfig,
        graph: GraphModel,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let clock = TurnClock::new(config.game.turn_limit)?;

        let mut players = BTreeMap::new();
        for (raw, name) in (1_u32..).zip(config.game.players.iter()) {
            let id = PlayerId::new(raw);
            players.insert(id, Player::new(id, name.as_str(), config.game.starting_cash));
        }

        let pathfinder = Pathfinder::from_graph(&graph);
        let market = opening_market(&config.market);

        info!(
            game = %config.game.name,
            seed = config.game.seed,
            turn_limit = config.game.turn_limit,
            players = players.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Game created"
        );

        Ok(Self {
            config,
            clock,
            graph,
            pathfinder,
            players,
            market,
            ledger: Ledger::new(),
            history: Vec::new(),
            last_summary: None,
            rng,
        })
    }

    /// Number of completed turns.
    pub const fn turn(&self) -> u64 {
        self.clock.turn()
    }

    /// Whether the configured number of turns has been played.
    pub const fn is_game_over(&self) -> bool {
        self.clock.is_over()
    }

    /// Player with the highest cumulative profit once the game is over.
    ///
    /// Ties go to the lowest player id. Returns `None` while turns remain or
    /// when there are no players.
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_game_over() {
            return None;
        }
        self.leader().map(|(id, _)| id)
    }

    /// Player currently ahead on cumulative profit, with that profit.
    ///
    /// Ties go to the lowest player id. `None` only when there are no
    /// players.
    pub fn leader(&self) -> Option<(PlayerId, Decimal)> {
        let mut best: Option<(PlayerId, Decimal)> = None;
        for player in self.players.values() {
            if best.is_none_or(|(_, profit)| player.cumulative_profit > profit) {
                best = Some((player.id, player.cumulative_profit));
            }
        }
        best
    }

    /// Re-derive the routing oracle from the current graph.
    pub fn rebuild_pathfinder(&mut self) {
        self.pathfinder.rebuild(&self.graph);
    }
}
