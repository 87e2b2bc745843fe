//! Enumeration types for the Oilnet economy.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::PlayerId;

// ---------------------------------------------------------------------------
// Transport modes
// ---------------------------------------------------------------------------

/// A way of moving barrels along an edge.
///
/// The declaration order is also the tie-break order when two modes on the
/// same edge cost exactly the same: the earlier mode wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TransportMode {
    /// Trucking over the road network. Always present on generated edges.
    Road,
    /// Rail freight. Present on some edges and only usable while available.
    Rail,
    /// A player-owned pipeline charging its owner's fee per barrel.
    Pipeline,
}

// ---------------------------------------------------------------------------
// Node roles
// ---------------------------------------------------------------------------

/// The economic role a node can play. A node may hold several roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NodeRole {
    /// Crude extraction site where a well can be built.
    Production,
    /// Site where a refinery can be built.
    Processing,
    /// Demand center buying refined product.
    Consumption,
    /// Import/export terminal with unlimited capacity at global price.
    Terminal,
}

impl core::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Production => "production",
            Self::Processing => "processing",
            Self::Consumption => "consumption",
            Self::Terminal => "terminal",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Category of a cash movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryType {
    /// Proceeds from selling crude or refined margin (market -> player).
    Sale,
    /// Per-barrel or per-capacity operating expense (player -> market).
    OperatingCost,
    /// Processing fee charged to the refinery owner (player -> market).
    ProcessingFee,
    /// Pipeline usage fee earned by the pipeline owner (market -> player).
    TransportFee,
    /// Surplus crude sold through a terminal (market -> player).
    Export,
    /// Capital spent on a well, refinery, upgrade, or pipeline (player -> market).
    Construction,
}

impl LedgerEntryType {
    /// Whether entries of this type flow from the market into a player's cash.
    pub const fn is_income(self) -> bool {
        matches!(self, Self::Sale | Self::TransportFee | Self::Export)
    }

    /// Whether entries of this type are part of per-turn operating results.
    ///
    /// Construction is capital spending and sits outside turn profit.
    pub const fn is_operating(self) -> bool {
        !matches!(self, Self::Construction)
    }
}

/// One side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Party {
    /// A player's cash account.
    Player(PlayerId),
    /// Everyone outside the players: consumers, suppliers, contractors.
    Market,
}

impl Party {
    /// Return the player id if this party is a player.
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Market => None,
        }
    }
}
