//! Cash ledger for the Oilnet economy.
//!
//! Every cash movement in a game goes through this ledger: sale proceeds,
//! operating costs, processing fees, pipeline fees, crude exports, and
//! construction payments. Players are never credited or charged without a
//! matching entry.
//!
//! # Architecture
//!
//! - [`ledger`] -- the [`Ledger`]: append-only log with recording helpers.
//! - [`transaction`] -- the [`TransactionBuilder`] for validated entries.
//! - [`reconcile`] -- per-turn check of ledger totals against the players'
//!   own revenue and cost accumulators.
//!
//! # Parties
//!
//! Each entry moves a positive amount between two [`Party`] values. The
//! market stands for everyone outside the players:
//!
//! | Type | From | To |
//! |------|------|----|
//! | Sale | Market | Player |
//! | TransportFee | Market | Player |
//! | Export | Market | Player |
//! | OperatingCost | Player | Market |
//! | ProcessingFee | Player | Market |
//! | Construction | Player | Market |
//!
//! [`Party`]: oilnet_types::Party
//!
//! # Usage
//!
//! ```
//! use oilnet_ledger::{Ledger, ReconcileResult};
//! use oilnet_types::{NodeId, Player, PlayerId};
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new();
//! let well_owner = PlayerId::new(1);
//!
//! ledger
//!     .record_sale(1, well_owner, Decimal::new(550, 0), "CRUDE_SALE", NodeId::new(0))
//!     .ok();
//!
//! let mut player = Player::new(well_owner, "Alice", Decimal::new(10_000, 0));
//! player.earn(Decimal::new(550, 0));
//! player.turn_profit = player.turn_revenue - player.turn_cost;
//!
//! assert_eq!(ledger.reconcile(1, [&player]), ReconcileResult::Balanced);
//! ```

pub mod ledger;
pub mod reconcile;
pub mod transaction;

pub use ledger::{EntryParams, Ledger};
pub use reconcile::ReconcileResult;
pub use transaction::TransactionBuilder;

use std::collections::BTreeMap;

use oilnet_types::{LedgerEntryType, PlayerId};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be non-zero.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// Amount must not be negative.
    #[error("ledger entry amount must be positive, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The from/to party does not match the entry type.
    #[error("invalid party for {entry_type:?} {side}: expected {expected}, got {actual}")]
    InvalidParty {
        /// The entry type being validated.
        entry_type: LedgerEntryType,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
        /// The expected party kind.
        expected: &'static str,
        /// The party that was supplied.
        actual: String,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A turn where the ledger disagrees with the players' accumulators.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReconcileAnomaly {
    /// The turn that failed to reconcile.
    pub turn: u64,
    /// Per-player mismatch: (`ledger_net`, `reported_profit`).
    pub mismatches: BTreeMap<PlayerId, (Decimal, Decimal)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for ReconcileAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
