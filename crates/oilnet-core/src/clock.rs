//! Turn counter and game length.
//!
//! The clock counts completed turns. It starts at zero, advances by one at
//! the end of every resolved turn, and reports the game as over once the
//! count reaches the configured limit.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u64::MAX")]
    TurnOverflow,

    /// A game must last at least one turn.
    #[error("turn limit must be at least 1")]
    ZeroTurnLimit,
}

/// Counts completed turns against a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TurnClock {
    /// Number of completed turns.
    turn: u64,
    /// Turn count at which the game ends.
    turn_limit: u64,
}

impl TurnClock {
    /// Create a clock at turn zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ZeroTurnLimit`] if `turn_limit` is 0.
    pub const fn new(turn_limit: u64) -> Result<Self, ClockError> {
        if turn_limit == 0 {
            return Err(ClockError::ZeroTurnLimit);
        }
        Ok(Self {
            turn: 0,
            turn_limit,
        })
    }

    /// Advance by one completed turn. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TurnOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.turn = self.turn.checked_add(1).ok_or(ClockError::TurnOverflow)?;
        Ok(self.turn)
    }

    /// Number of completed turns.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// The turn currently being (or about to be) resolved, starting at 1.
    pub const fn current(&self) -> u64 {
        self.turn.saturating_add(1)
    }

    /// Configured game length.
    pub const fn turn_limit(&self) -> u64 {
        self.turn_limit
    }

    /// Turns left before the game ends.
    pub const fn remaining(&self) -> u64 {
        self.turn_limit.saturating_sub(self.turn)
    }

    /// Whether the configured number of turns has been played.
    pub const fn is_over(&self) -> bool {
        self.turn >= self.turn_limit
    }
}
