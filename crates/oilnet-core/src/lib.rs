//! Turn resolver, mutation commands, and game orchestration for Oilnet.
//!
//! This crate owns the nine-phase turn cycle that drives the economy:
//! Reset, Price Update, Production, Demand Update, Routing, Growth Update,
//! Profit Settlement, Market Share, and Persist.
//!
//! # Modules
//!
//! - [`clock`] -- Turn counter bounded by the configured turn limit.
//! - [`commands`] -- The Mutation API: building wells, refineries and
//!   pipelines, and setting fees.
//! - [`config`] -- Configuration loading from `oilnet.yaml` into
//!   strongly-typed structs.
//! - [`game`] -- [`GameState`], the single owner of all mutable state.
//! - [`market`] -- Price walk and demand formulas.
//! - [`query`] -- Read-only summaries for callers between turns.
//! - [`random`] -- [`RandomSource`] trait and its seeded implementation.
//! - [`runner`] -- Runs a game to completion.
//! - [`turn`] -- The turn resolver.
//!
//! [`GameState`]: game::GameState
//! [`RandomSource`]: random::RandomSource

pub mod clock;
pub mod commands;
pub mod config;
pub mod game;
pub mod market;
pub mod query;
pub mod random;
pub mod runner;
pub mod turn;
