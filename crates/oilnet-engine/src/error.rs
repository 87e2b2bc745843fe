//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the game run so
//! `main` can propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: oilnet_core::config::ConfigError,
    },

    /// The game could not be set up.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: oilnet_core::game::GameError,
    },

    /// The map broke a graph invariant.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: oilnet_world::WorldError,
    },

    /// An opening move was rejected.
    #[error("opening move {index} rejected: {source}")]
    OpeningMove {
        /// Position of the move in the scenario file.
        index: usize,
        /// The underlying command error.
        source: oilnet_core::commands::CommandError,
    },

    /// The game loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: oilnet_core::runner::RunnerError,
    },

    /// A scenario file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A scenario file is not valid YAML for a scenario.
    #[error("failed to parse scenario YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },

    /// The final report could not be serialized.
    #[error("failed to serialize report: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging setup failed: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
