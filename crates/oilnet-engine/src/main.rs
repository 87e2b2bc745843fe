//! Game engine binary for Oilnet.
//!
//! Usage: `oilnet-engine [config.yaml] [scenario.yaml]`
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`oilnet.yaml` in the working directory when no
//!    path is given, defaults when neither exists) and apply `OILNET_SEED`
//! 2. Initialize structured logging (tracing)
//! 3. Load the scenario, or the sample map when none is given
//! 4. Create the game and apply the scenario's opening moves
//! 5. Run every turn
//! 6. Print the final report as JSON on stdout

mod error;
mod report;
mod scenario_file;

use std::path::{Path, PathBuf};

use oilnet_core::config::{GameConfig, LoggingConfig};
use oilnet_core::game::GameState;
use oilnet_core::runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::{GameReport, ProgressCallback};
use crate::scenario_file::ScenarioFile;

/// Config file looked up in the working directory when none is passed.
const DEFAULT_CONFIG_PATH: &str = "oilnet.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any startup step or the game itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config_arg = args.next().map(PathBuf::from);
    let scenario_arg = args.next().map(PathBuf::from);

    // 1. Load configuration.
    let config = load_config(config_arg.as_deref())?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        game = config.game.name,
        seed = config.game.seed,
        turn_limit = config.game.turn_limit,
        players = config.game.players.len(),
        "Configuration loaded"
    );

    // 3. Load the scenario.
    let scenario = match &scenario_arg {
        Some(path) => ScenarioFile::from_file(path)?,
        None => ScenarioFile::default(),
    };
    let graph = scenario.build_graph()?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        connected = graph.is_connected(),
        "Map ready"
    );

    // 4. Create the game and apply opening moves.
    let mut state = GameState::new(config, graph).map_err(EngineError::from)?;
    scenario.apply_opening_moves(&mut state)?;

    // 5. Run the game.
    let mut progress = ProgressCallback::default();
    let result = runner::run_game(&mut state, &mut progress).map_err(EngineError::from)?;
    info!(
        turns = result.turns,
        winner = result.winner.map(|w| w.into_inner()),
        anomalies = progress.anomalies,
        "oilnet-engine finished"
    );

    // 6. Print the report.
    let report = GameReport::new(&state, &result);
    let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    println!("{json}");

    Ok(())
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] if it
/// exists, or fall back to defaults. `OILNET_SEED` applies in every case.
fn load_config(path: Option<&Path>) -> Result<GameConfig, EngineError> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let config = match path {
        Some(path) => GameConfig::from_file(path)?,
        None if default_path.exists() => GameConfig::from_file(default_path)?,
        None => GameConfig::parse("")?,
    };
    config.validate()?;
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
