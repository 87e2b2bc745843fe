//! Transport graph for the Oilnet economy.
//!
//! This crate owns the spatial side of the game:
//!
//! - [`GraphModel`]: nodes with economic roles joined by undirected,
//!   multi-modal edges
//! - [`Pathfinder`]: all-pairs cheapest transport costs with path
//!   reconstruction
//! - the cheapest-supply search comparing imports with well-to-refinery
//!   routes ([`SupplyQuote`])
//! - [`Scenario`] files and the built-in sample map
//!
//! Nothing here moves money. Settlement and accounting live in the core and
//! ledger crates.

pub mod edge;
pub mod error;
pub mod graph;
pub mod pathfinder;
pub mod scenario;
pub mod starting_map;
pub mod supply;

pub use error::WorldError;
pub use graph::GraphModel;
pub use pathfinder::{DetailedRoute, Pathfinder, RouteSegment};
pub use scenario::Scenario;
pub use starting_map::{SAMPLE_MAP_IDS, SampleMapIds, create_sample_map, role_census};
pub use supply::{ExportQuote, ImportQuote, RouteQuote, SupplyPricing, SupplyQuote};
