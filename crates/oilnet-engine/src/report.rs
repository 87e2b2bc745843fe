//! The end-of-game report and the per-turn progress callback.

use oilnet_core::game::GameState;
use oilnet_core::runner::{GameResult, TurnCallback};
use oilnet_core::turn::TurnSummary;
use oilnet_types::{MarketSummary, PlayerSummary};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

/// Everything printed once the game is over.
#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    /// Name of the game from the configuration.
    pub game: String,
    /// Seed the game was played with.
    pub seed: u64,
    /// Turns played.
    pub turns: u64,
    /// Winning player, if any.
    pub winner: Option<PlayerSummary>,
    /// Every player's final figures.
    pub players: Vec<PlayerSummary>,
    /// Market totals of the final turn.
    pub market: MarketSummary,
    /// Ledger entries recorded over the game.
    pub ledger_entries: usize,
}

impl GameReport {
    /// Assemble the report from a finished game.
    pub fn new(state: &GameState, result: &GameResult) -> Self {
        Self {
            game: state.config.game.name.clone(),
            seed: state.config.game.seed,
            turns: state.turn(),
            winner: result.winner.and_then(|id| state.player_summary(id)),
            players: state.player_summaries(),
            market: state.market_summary(),
            ledger_entries: state.ledger.len(),
        }
    }
}

/// Logs one line per turn and counts ledger anomalies.
#[derive(Debug, Default)]
pub struct ProgressCallback {
    /// Turns whose ledger did not reconcile.
    pub anomalies: u64,
}

impl TurnCallback for ProgressCallback {
    fn on_turn(&mut self, summary: &TurnSummary, state: &GameState) {
        if !summary.reconciliation.is_balanced() {
            self.anomalies = self.anomalies.saturating_add(1);
            warn!(turn = summary.turn, "Turn finished with a ledger anomaly");
        }
        let leader = state.leader();
        info!(
            turn = summary.turn,
            remaining = state.clock.remaining(),
            crude = %summary.crude_price,
            refined = %summary.refined_price,
            served = %summary.served,
            leader = leader.map(|(id, _)| id.into_inner()),
            leader_profit = %leader.map_or(Decimal::ZERO, |(_, profit)| profit),
            "Turn complete"
        );
    }
}
