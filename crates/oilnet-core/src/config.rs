//! Configuration loading and typed config structures for an Oilnet game.
//!
//! A game is configured from a YAML file (conventionally `oilnet.yaml`).
//! Every field has a default, so an empty file or no file at all yields a
//! playable game. The seed can be overridden from the environment with
//! `OILNET_SEED` for replaying a specific run.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `game.seed`.
pub const SEED_ENV_VAR: &str = "OILNET_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unplayable game.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Game length, seed, and players.
    #[serde(default)]
    pub game: GameSection,

    /// Price walk, demand, and terminal parameters.
    #[serde(default)]
    pub market: MarketConfig,

    /// Construction prices for player-built assets.
    #[serde(default)]
    pub construction: ConstructionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OILNET_SEED` overrides `game.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if `OILNET_SEED` is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if `OILNET_SEED` is set but not a number.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override values from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `OILNET_SEED` is not a `u64`.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var(SEED_ENV_VAR) {
            self.game.seed = val.trim().parse().map_err(|err| ConfigError::Invalid {
                reason: format!("{SEED_ENV_VAR}={val:?} is not a valid seed: {err}"),
            })?;
        }
        Ok(())
    }

    /// Reject configurations that cannot produce a meaningful game.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.turn_limit == 0 {
            return Err(invalid("game.turn_limit must be at least 1"));
        }
        if self.game.players.is_empty() {
            return Err(invalid("game.players must name at least one player"));
        }
        if self.game.starting_cash.is_sign_negative() {
            return Err(invalid("game.starting_cash must not be negative"));
        }

        let market = &self.market;
        let non_negative = [
            ("market.crude_price", market.crude_price),
            ("market.refined_price", market.refined_price),
            ("market.price_floor", market.price_floor),
            ("market.price_ceiling", market.price_ceiling),
            ("market.volatility", market.volatility),
            ("market.refined_margin", market.refined_margin),
            ("market.reference_price", market.reference_price),
            ("market.elasticity", market.elasticity),
            ("market.terminal_fee", market.terminal_fee),
            ("market.demand_jitter", market.demand_jitter),
            ("construction.refinery_cost", self.construction.refinery_cost),
            ("construction.upgrade_cost", self.construction.upgrade_cost),
            ("construction.pipeline_cost_per_unit", self.construction.pipeline_cost_per_unit),
            ("construction.pipeline_capacity", self.construction.pipeline_capacity),
            ("construction.pipeline_fee", self.construction.pipeline_fee),
            ("construction.refinery_fee", self.construction.refinery_fee),
        ];
        if let Some((name, _)) = non_negative.iter().find(|(_, v)| v.is_sign_negative()) {
            return Err(invalid(&format!("{name} must not be negative")));
        }

        if market.price_floor > market.price_ceiling {
            return Err(invalid("market.price_floor must not exceed market.price_ceiling"));
        }
        if market.reference_price.is_zero() {
            return Err(invalid("market.reference_price must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Game length, seed, and players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSection {
    /// Human-readable game name.
    #[serde(default = "default_game_name")]
    pub name: String,

    /// Random seed for the price walk and demand jitter.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of turns before the game ends.
    #[serde(default = "default_turn_limit")]
    pub turn_limit: u64,

    /// Cash each player starts with.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: Decimal,

    /// Player names; ids are assigned from 1 in this order.
    #[serde(default = "default_players")]
    pub players: Vec<String>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            name: default_game_name(),
            seed: default_seed(),
            turn_limit: default_turn_limit(),
            starting_cash: default_starting_cash(),
            players: default_players(),
        }
    }
}

/// Market parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Opening crude price per barrel.
    #[serde(default = "default_crude_price")]
    pub crude_price: Decimal,

    /// Opening refined price per barrel.
    #[serde(default = "default_refined_price")]
    pub refined_price: Decimal,

    /// Lowest price the walk may reach.
    #[serde(default = "default_price_floor")]
    pub price_floor: Decimal,

    /// Highest price the walk may reach.
    #[serde(default = "default_price_ceiling")]
    pub price_ceiling: Decimal,

    /// Largest relative price move per turn (0.05 = 5%).
    #[serde(default = "default_volatility")]
    pub volatility: Decimal,

    /// Margin restored when refined falls below crude.
    #[serde(default = "default_refined_margin")]
    pub refined_margin: Decimal,

    /// Price at which a node's demand equals its base demand.
    #[serde(default = "default_reference_price")]
    pub reference_price: Decimal,

    /// Demand elasticity exponent.
    #[serde(default = "default_elasticity")]
    pub elasticity: Decimal,

    /// Default per-barrel terminal fee.
    #[serde(default = "default_terminal_fee")]
    pub terminal_fee: Decimal,

    /// Largest additive noise on a node's growth rate per turn.
    #[serde(default = "default_demand_jitter")]
    pub demand_jitter: Decimal,

    /// Export unsold well capacity through terminals.
    #[serde(default)]
    pub export_surplus: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            crude_price: default_crude_price(),
            refined_price: default_refined_price(),
            price_floor: default_price_floor(),
            price_ceiling: default_price_ceiling(),
            volatility: default_volatility(),
            refined_margin: default_refined_margin(),
            reference_price: default_reference_price(),
            elasticity: default_elasticity(),
            terminal_fee: default_terminal_fee(),
            demand_jitter: default_demand_jitter(),
            export_surplus: false,
        }
    }
}

/// Construction prices. Well prices live on each production site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionConfig {
    /// Price of a new refinery.
    #[serde(default = "default_refinery_cost")]
    pub refinery_cost: Decimal,

    /// Price of one upgrade, multiplied by the level being reached.
    #[serde(default = "default_upgrade_cost")]
    pub upgrade_cost: Decimal,

    /// Pipeline price per unit of the edge's road cost.
    #[serde(default = "default_pipeline_cost_per_unit")]
    pub pipeline_cost_per_unit: Decimal,

    /// Rated capacity of a new pipeline.
    #[serde(default = "default_pipeline_capacity")]
    pub pipeline_capacity: Decimal,

    /// Opening fee of a new pipeline.
    #[serde(default = "default_pipeline_fee")]
    pub pipeline_fee: Decimal,

    /// Opening processing fee of a new refinery.
    #[serde(default = "default_refinery_fee")]
    pub refinery_fee: Decimal,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            refinery_cost: default_refinery_cost(),
            upgrade_cost: default_upgrade_cost(),
            pipeline_cost_per_unit: default_pipeline_cost_per_unit(),
            pipeline_capacity: default_pipeline_capacity(),
            pipeline_fee: default_pipeline_fee(),
            refinery_fee: default_refinery_fee(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_game_name() -> String {
    "Oilnet".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_turn_limit() -> u64 {
    40
}

fn default_starting_cash() -> Decimal {
    Decimal::new(20_000, 0)
}

fn default_players() -> Vec<String> {
    vec!["Alice".to_owned(), "Bob".to_owned()]
}

fn default_crude_price() -> Decimal {
    Decimal::new(20, 0)
}

fn default_refined_price() -> Decimal {
    Decimal::new(35, 0)
}

fn default_price_floor() -> Decimal {
    Decimal::new(5, 0)
}

fn default_price_ceiling() -> Decimal {
    Decimal::new(120, 0)
}

fn default_volatility() -> Decimal {
    Decimal::new(5, 2)
}

fn default_refined_margin() -> Decimal {
    Decimal::new(5, 0)
}

fn default_reference_price() -> Decimal {
    Decimal::new(35, 0)
}

fn default_elasticity() -> Decimal {
    Decimal::new(5, 1)
}

fn default_terminal_fee() -> Decimal {
    Decimal::new(3, 0)
}

fn default_demand_jitter() -> Decimal {
    Decimal::new(5, 3)
}

fn default_refinery_cost() -> Decimal {
    Decimal::new(6000, 0)
}

fn default_upgrade_cost() -> Decimal {
    Decimal::new(4000, 0)
}

fn default_pipeline_cost_per_unit() -> Decimal {
    Decimal::new(500, 0)
}

fn default_pipeline_capacity() -> Decimal {
    Decimal::new(150, 0)
}

fn default_pipeline_fee() -> Decimal {
    Decimal::new(1, 0)
}

fn default_refinery_fee() -> Decimal {
    Decimal::new(2, 0)
}

fn default_log_level() -> String {
    "info".to_owned()
}
