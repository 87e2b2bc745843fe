//! Game loop runner.
//!
//! [`run_game`] drives [`advance_turn`] until the turn limit is reached,
//! notifying a [`TurnCallback`] after every turn, and reports the winner.
//!
//! [`advance_turn`]: crate::turn::advance_turn

use oilnet_types::PlayerId;
use tracing::info;

use crate::game::GameState;
use crate::turn::{self, TurnError, TurnSummary};

/// Errors that can occur during the game run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn failed to resolve.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TurnError,
    },
}

/// Result of a completed game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Player with the highest cumulative profit.
    pub winner: Option<PlayerId>,
    /// Turns resolved by this run.
    pub turns: u64,
    /// Summary of the last resolved turn, if any.
    pub final_summary: Option<TurnSummary>,
}

/// Callback invoked after each turn completes.
pub trait TurnCallback {
    /// Called after a turn resolves successfully.
    fn on_turn(&mut self, summary: &TurnSummary, state: &GameState);
}

/// A callback that ignores every turn.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary, _state: &GameState) {}
}

/// Resolve turns until the game is over.
///
/// A game that is already over returns immediately with zero turns run.
///
/// # Errors
///
/// Returns [`RunnerError`] if a turn fails to resolve.
pub fn run_game(
    state: &mut GameState,
    callback: &mut dyn TurnCallback,
) -> Result<GameResult, RunnerError> {
    let mut final_summary = state.last_summary.clone();
    let mut turns: u64 = 0;

    info!(
        turn = state.turn(),
        turn_limit = state.clock.turn_limit(),
        "Game starting"
    );

    while !state.is_game_over() {
        let summary = turn::advance_turn(state)?;
        turns = turns.saturating_add(1);
        callback.on_turn(&summary, state);
        final_summary = Some(summary);
    }

    let winner = state.winner();
    info!(
        turns,
        winner = winner.map(|w| w.into_inner()),
        "Game over"
    );

    Ok(GameResult {
        winner,
        turns,
        final_summary,
    })
}
