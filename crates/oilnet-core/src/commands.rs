//! The Mutation API: construction and fee-setting commands.
//!
//! Every command validates completely before touching state, so a failure
//! leaves the game unchanged. On success the command pays for itself
//! through the ledger, mutates the graph, and rebuilds the pathfinder.

use oilnet_types::{EdgeId, NodeId, NodeRole, PipelineLink, PlayerId};
use oilnet_world::edge;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::GameState;

/// Errors returned by the Mutation API.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The player cannot afford the construction.
    #[error("player {player} needs {required} but has {available}")]
    InsufficientFunds {
        /// The acting player.
        player: PlayerId,
        /// Price of the construction.
        required: Decimal,
        /// Cash on hand.
        available: Decimal,
    },

    /// The asset already exists, is missing, or belongs to someone else.
    #[error("invalid target {target}: {reason}")]
    InvalidTarget {
        /// Node or edge the command was aimed at.
        target: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The node does not have the role the command needs.
    #[error("node {node} has no {role} role")]
    NotApplicableRole {
        /// The node.
        node: NodeId,
        /// The missing role.
        role: NodeRole,
    },

    /// No such player.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// No such node.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// No such edge.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Fees must be non-negative.
    #[error("invalid fee {fee}: fees must not be negative")]
    InvalidFee {
        /// The rejected fee.
        fee: Decimal,
    },

    /// The ledger refused the construction payment.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: oilnet_ledger::LedgerError,
    },
}

/// A serializable command, as found in scenario opening moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Build a well on a production node.
    BuildWell {
        /// Acting player.
        player: PlayerId,
        /// Target node.
        node: NodeId,
    },
    /// Build a refinery on a processing node.
    BuildRefinery {
        /// Acting player.
        player: PlayerId,
        /// Target node.
        node: NodeId,
    },
    /// Double the capacity of an owned refinery.
    UpgradeRefinery {
        /// Acting player.
        player: PlayerId,
        /// Target node.
        node: NodeId,
    },
    /// Lay a pipeline along an edge.
    BuildPipeline {
        /// Acting player.
        player: PlayerId,
        /// Target edge.
        edge: EdgeId,
    },
    /// Change an owned refinery's per-barrel fee.
    SetProcessingFee {
        /// Acting player.
        player: PlayerId,
        /// Target node.
        node: NodeId,
        /// New fee.
        fee: Decimal,
    },
    /// Change an owned pipeline's per-barrel fee.
    SetPipelineFee {
        /// Acting player.
        player: PlayerId,
        /// Target edge.
        edge: EdgeId,
        /// New fee.
        fee: Decimal,
    },
}

impl Command {
    /// Run the command against `state`.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] of the underlying operation.
    pub fn apply(&self, state: &mut GameState) -> Result<(), CommandError> {
        match *self {
            Self::BuildWell { player, node } => state.build_well(player, node),
            Self::BuildRefinery { player, node } => state.build_refinery(player, node),
            Self::UpgradeRefinery { player, node } => state.upgrade_refinery(player, node),
            Self::BuildPipeline { player, edge } => state.build_pipeline(player, edge),
            Self::SetProcessingFee { player, node, fee } => {
                state.set_processing_fee(player, node, fee)
            }
            Self::SetPipelineFee { player, edge, fee } => state.set_pipeline_fee(player, edge, fee),
        }
    }
}

impl GameState {
    /// Buy the well on a production node.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotApplicableRole`] without a production role,
    /// [`CommandError::InvalidTarget`] if the well is already owned,
    /// [`CommandError::InsufficientFunds`] if the player cannot pay.
    pub fn build_well(&mut self, player: PlayerId, node: NodeId) -> Result<(), CommandError> {
        let site = self
            .graph
            .node(node)
            .ok_or(CommandError::NodeNotFound(node))?
            .production
            .as_ref()
            .ok_or(CommandError::NotApplicableRole {
                node,
                role: NodeRole::Production,
            })?;
        if site.owner.is_some() {
            return Err(invalid_node(node, "well already built"));
        }
        let cost = site.construction_cost;
        self.ensure_funds(player, cost)?;

        self.pay_construction(player, cost, "BUILD_WELL", Some(node), None)?;
        if let Some(site) = self.graph.node_mut(node).and_then(|n| n.production.as_mut()) {
            site.owner = Some(player);
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.wells.push(node);
        }
        self.rebuild_pathfinder();
        info!(%player, %node, %cost, "Well built");
        Ok(())
    }

    /// Build a refinery on a processing node.
    ///
    /// # Errors
    ///
    /// [`CommandError::NotApplicableRole`] without a processing role,
    /// [`CommandError::InvalidTarget`] if a refinery already stands there,
    /// [`CommandError::InsufficientFunds`] if the player cannot pay.
    pub fn build_refinery(&mut self, player: PlayerId, node: NodeId) -> Result<(), CommandError> {
        let site = self.processing_site(node)?;
        if site.owner.is_some() {
            return Err(invalid_node(node, "refinery already built"));
        }
        let cost = self.config.construction.refinery_cost;
        self.ensure_funds(player, cost)?;

        self.pay_construction(player, cost, "BUILD_REFINERY", Some(node), None)?;
        let fee = self.config.construction.refinery_fee;
        if let Some(site) = self.graph.node_mut(node).and_then(|n| n.processing.as_mut()) {
            site.owner = Some(player);
            site.fee = fee;
            site.level = 0;
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.refineries.push(node);
        }
        self.rebuild_pathfinder();
        info!(%player, %node, %cost, "Refinery built");
        Ok(())
    }

    /// Upgrade an owned refinery, doubling its capacity.
    ///
    /// Reaching level `n` costs `upgrade_cost * n`.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidTarget`] if there is no refinery or the player
    /// does not own it, [`CommandError::InsufficientFunds`] if they cannot pay.
    pub fn upgrade_refinery(&mut self, player: PlayerId, node: NodeId) -> Result<(), CommandError> {
        let site = self.processing_site(node)?;
        match site.owner {
            None => return Err(invalid_node(node, "no refinery to upgrade")),
            Some(owner) if owner != player => {
                return Err(invalid_node(node, "refinery owned by another player"));
            }
            Some(_) => {}
        }
        let next_level = site.level.checked_add(1).ok_or(CommandError::InvalidTarget {
            target: node.to_string(),
            reason: "refinery at maximum level",
        })?;
        let cost = self
            .config
            .construction
            .upgrade_cost
            .saturating_mul(Decimal::from(next_level));
        self.ensure_funds(player, cost)?;

        self.pay_construction(player, cost, "UPGRADE_REFINERY", Some(node), None)?;
        if let Some(site) = self.graph.node_mut(node).and_then(|n| n.processing.as_mut()) {
            site.level = next_level;
        }
        self.rebuild_pathfinder();
        info!(%player, %node, level = next_level, %cost, "Refinery upgraded");
        Ok(())
    }

    /// Lay a pipeline along an edge.
    ///
    /// The price is `pipeline_cost_per_unit` times the edge's road cost.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidTarget`] if the edge already has a pipeline,
    /// [`CommandError::InsufficientFunds`] if the player cannot pay.
    pub fn build_pipeline(
        &mut self,
        player: PlayerId,
        edge_id: EdgeId,
    ) -> Result<(), CommandError> {
        let target = self
            .graph
            .edge(edge_id)
            .ok_or(CommandError::EdgeNotFound(edge_id))?;
        if target.pipeline.is_some() {
            return Err(CommandError::InvalidTarget {
                target: edge_id.to_string(),
                reason: "pipeline already built",
            });
        }
        let cost =
            edge::pipeline_build_cost(target, self.config.construction.pipeline_cost_per_unit);
        self.ensure_funds(player, cost)?;

        self.pay_construction(player, cost, "BUILD_PIPELINE", None, Some(edge_id))?;
        let link = PipelineLink {
            owner: player,
            capacity: self.config.construction.pipeline_capacity,
            fee: self.config.construction.pipeline_fee,
            flow: Decimal::ZERO,
        };
        if let Some(target) = self.graph.edge_mut(edge_id) {
            edge::lay_pipeline(target, link);
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.pipelines.push(edge_id);
        }
        self.rebuild_pathfinder();
        info!(%player, edge = %edge_id, %cost, "Pipeline built");
        Ok(())
    }

    /// Set the per-barrel fee of an owned refinery.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidFee`] for a negative fee,
    /// [`CommandError::InvalidTarget`] if the player does not own a refinery
    /// on the node.
    pub fn set_processing_fee(
        &mut self,
        player: PlayerId,
        node: NodeId,
        fee: Decimal,
    ) -> Result<(), CommandError> {
        self.player_exists(player)?;
        if fee.is_sign_negative() && !fee.is_zero() {
            return Err(CommandError::InvalidFee { fee });
        }
        let site = self.processing_site(node)?;
        if site.owner != Some(player) {
            return Err(invalid_node(node, "player does not own this refinery"));
        }

        if let Some(site) = self.graph.node_mut(node).and_then(|n| n.processing.as_mut()) {
            site.fee = fee;
        }
        self.rebuild_pathfinder();
        info!(%player, %node, %fee, "Processing fee set");
        Ok(())
    }

    /// Set the per-barrel fee of an owned pipeline.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidFee`] for a negative fee,
    /// [`CommandError::InvalidTarget`] if the player does not own a pipeline
    /// on the edge.
    pub fn set_pipeline_fee(
        &mut self,
        player: PlayerId,
        edge_id: EdgeId,
        fee: Decimal,
    ) -> Result<(), CommandError> {
        self.player_exists(player)?;
        if fee.is_sign_negative() && !fee.is_zero() {
            return Err(CommandError::InvalidFee { fee });
        }
        let owner = self
            .graph
            .edge(edge_id)
            .ok_or(CommandError::EdgeNotFound(edge_id))?
            .pipeline
            .as_ref()
            .map(|p| p.owner);
        if owner != Some(player) {
            return Err(CommandError::InvalidTarget {
                target: edge_id.to_string(),
                reason: "player does not own a pipeline on this edge",
            });
        }

        if let Some(link) = self.graph.edge_mut(edge_id).and_then(|e| e.pipeline.as_mut()) {
            link.fee = fee;
        }
        self.rebuild_pathfinder();
        info!(%player, edge = %edge_id, %fee, "Pipeline fee set");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation helpers
    // -----------------------------------------------------------------------

    fn player_exists(&self, player: PlayerId) -> Result<(), CommandError> {
        if self.players.contains_key(&player) {
            Ok(())
        } else {
            Err(CommandError::UnknownPlayer(player))
        }
    }

    fn processing_site(&self, node: NodeId) -> Result<&oilnet_types::ProcessingSite, CommandError> {
        self.graph
            .node(node)
            .ok_or(CommandError::NodeNotFound(node))?
            .processing
            .as_ref()
            .ok_or(CommandError::NotApplicableRole {
                node,
                role: NodeRole::Processing,
            })
    }

    fn ensure_funds(&self, player: PlayerId, required: Decimal) -> Result<(), CommandError> {
        let available = self
            .players
            .get(&player)
            .ok_or(CommandError::UnknownPlayer(player))?
            .cash;
        if available < required {
            return Err(CommandError::InsufficientFunds {
                player,
                required,
                available,
            });
        }
        Ok(())
    }

    /// Record the payment first so a ledger failure leaves cash untouched.
    fn pay_construction(
        &mut self,
        player: PlayerId,
        cost: Decimal,
        reason: &str,
        node: Option<NodeId>,
        edge_id: Option<EdgeId>,
    ) -> Result<(), CommandError> {
        if cost > Decimal::ZERO {
            let turn = self.clock.current();
            self.ledger
                .record_construction(turn, player, cost, reason, node, edge_id)?;
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.cash = p.cash.saturating_sub(cost);
            p.capital_spent = p.capital_spent.saturating_add(cost);
        }
        Ok(())
    }
}

fn invalid_node(node: NodeId, reason: &'static str) -> CommandError {
    CommandError::InvalidTarget {
        target: node.to_string(),
        reason,
    }
}
