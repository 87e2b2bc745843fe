//! Shared type definitions for the Oilnet commodity economy.
//!
//! This crate is the single source of truth for the values that flow
//! between the graph model, the pathfinder, the turn resolver, and the UI.
//! Snapshot types are exported to `TypeScript` via `ts-rs` for the map
//! renderer.
//!
//! # Modules
//!
//! - [`ids`] -- Stable integer identifiers for nodes, edges, and players
//! - [`enums`] -- Transport modes, node roles, ledger categories
//! - [`structs`] -- Nodes with role records, edges with transport modes,
//!   players, market state, ledger entries, and snapshots

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{LedgerEntryType, NodeRole, Party, TransportMode};
pub use ids::{EdgeId, NodeId, PlayerId};
pub use structs::{
    ConsumptionSite, Edge, LedgerEntry, MarketState, MarketSummary, ModeLink, Node, PipelineLink,
    Player, PlayerSummary, PlayerTurnRecord, Position, ProcessingSite, ProductionSite,
    TerminalSite, TurnSnapshot,
};
