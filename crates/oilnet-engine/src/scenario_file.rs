//! Scenario files: a map plus the moves players make before turn 1.
//!
//! ```yaml
//! nodes: [...]
//! edges: [...]
//! opening_moves:
//!   - command: build_well
//!     player: 1
//!     node: 3
//! ```
//!
//! A file with no `nodes` key is treated as "use the sample map", so a
//! scenario can consist of opening moves alone.

use std::path::Path;

use oilnet_core::commands::Command;
use oilnet_core::game::GameState;
use oilnet_world::{GraphModel, Scenario, create_sample_map};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

/// Contents of a scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioFile {
    /// The map. Empty means the sample map.
    #[serde(flatten)]
    pub scenario: Scenario,
    /// Commands applied in order before the first turn.
    #[serde(default)]
    pub opening_moves: Vec<Command>,
}

impl ScenarioFile {
    /// Read a scenario file from disk.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse a scenario from YAML text. Empty text is an empty scenario.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Build the graph, falling back to the sample map for an empty scenario.
    pub fn build_graph(&self) -> Result<GraphModel, EngineError> {
        if self.scenario.nodes.is_empty() {
            info!("Scenario has no nodes, using the sample map");
            let (graph, _) = create_sample_map()?;
            return Ok(graph);
        }
        Ok(self.scenario.clone().into_graph()?)
    }

    /// Apply every opening move to `state`, stopping at the first rejection.
    pub fn apply_opening_moves(&self, state: &mut GameState) -> Result<(), EngineError> {
        for (index, command) in self.opening_moves.iter().enumerate() {
            command
                .apply(state)
                .map_err(|source| EngineError::OpeningMove { index, source })?;
        }
        info!(moves = self.opening_moves.len(), "Opening moves applied");
        Ok(())
    }
}
