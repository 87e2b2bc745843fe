//! Per-edge cost evaluation across transport modes.
//!
//! An edge can carry several ways of moving barrels: the road that every
//! generated edge has, an optional rail line that is only usable while
//! available, and a player-built pipeline whose per-barrel cost is the fee
//! its owner sets. The pathfinder sees each edge as a single weight: the
//! cheapest usable mode.
//!
//! # Tie-break
//!
//! When two modes cost exactly the same, the one declared first in
//! [`TransportMode`] wins (road, then rail, then pipeline), so a pipeline
//! only carries traffic once its fee undercuts the alternatives.

use oilnet_types::{Edge, PipelineLink, TransportMode};
use rust_decimal::Decimal;

use crate::error::WorldError;

/// Cost of traversing `edge` with `mode`, or `None` if the mode is absent or
/// currently unavailable.
pub fn mode_cost(edge: &Edge, mode: TransportMode) -> Option<Decimal> {
    match mode {
        TransportMode::Pipeline => edge.pipeline.as_ref().map(|p| p.fee),
        TransportMode::Road | TransportMode::Rail => edge
            .modes
            .get(&mode)
            .filter(|link| link.available)
            .map(|link| link.cost),
    }
}

/// The cheapest usable mode on `edge` and its per-barrel cost.
///
/// Returns `None` when no mode is usable, which makes the edge invisible
/// to routing.
pub fn effective_cost(edge: &Edge) -> Option<(TransportMode, Decimal)> {
    let mut best: Option<(TransportMode, Decimal)> = None;
    for mode in [TransportMode::Road, TransportMode::Rail, TransportMode::Pipeline] {
        let Some(cost) = mode_cost(edge, mode) else {
            continue;
        };
        if best.is_none_or(|(_, current)| cost < current) {
            best = Some((mode, cost));
        }
    }
    best
}

/// Check the static invariants of a generated edge.
///
/// # Errors
///
/// Returns [`WorldError::PipelineAsPlainMode`] if the mode table lists a
/// pipeline, or [`WorldError::NegativeEdgeCost`] if any declared cost or
/// pipeline fee is negative.
pub fn validate(edge: &Edge) -> Result<(), WorldError> {
    if edge.modes.contains_key(&TransportMode::Pipeline) {
        return Err(WorldError::PipelineAsPlainMode(edge.id));
    }
    for (mode, link) in &edge.modes {
        if is_negative(link.cost) {
            return Err(WorldError::NegativeEdgeCost {
                edge: edge.id,
                mode: *mode,
            });
        }
    }
    if edge.pipeline.as_ref().is_some_and(|p| is_negative(p.fee)) {
        return Err(WorldError::NegativeEdgeCost {
            edge: edge.id,
            mode: TransportMode::Pipeline,
        });
    }
    Ok(())
}

/// Cost of laying a pipeline along `edge`, proportional to its road cost.
///
/// Edges without a road price the pipeline off their cheapest plain mode;
/// edges with no plain mode at all cost `cost_per_unit` flat.
pub fn pipeline_build_cost(edge: &Edge, cost_per_unit: Decimal) -> Decimal {
    let basis = mode_cost(edge, TransportMode::Road)
        .or_else(|| {
            edge.modes
                .values()
                .map(|link| link.cost)
                .min()
        })
        .unwrap_or(Decimal::ONE);
    cost_per_unit.saturating_mul(basis.max(Decimal::ONE))
}

/// Lay a new pipeline on `edge`.
pub fn lay_pipeline(edge: &mut Edge, pipeline: PipelineLink) {
    edge.pipeline = Some(pipeline);
}

fn is_negative(value: Decimal) -> bool {
    value.is_sign_negative() && !value.is_zero()
}

#[cfg(test)]
mod tests {
    use oilnet_types::{EdgeId, ModeLink, NodeId, PlayerId};
    use rust_decimal_macros::dec;

    use super::*;

    fn road_edge(cost: Decimal) -> Edge {
        Edge::road(EdgeId::new(1), NodeId::new(1), NodeId::new(2), cost)
    }

    fn pipeline(fee: Decimal) -> PipelineLink {
        PipelineLink {
            owner: PlayerId::new(1),
            capacity: dec!(100),
            fee,
            flow: Decimal::ZERO,
        }
    }

    #[test]
    fn road_only_edge_uses_road() {
        let edge = road_edge(dec!(4));
        assert_eq!(effective_cost(&edge), Some((TransportMode::Road, dec!(4))));
    }

    #[test]
    fn unavailable_rail_is_ignored() {
        let mut edge = road_edge(dec!(4));
        edge.modes.insert(
            TransportMode::Rail,
            ModeLink {
                available: false,
                cost: dec!(1),
            },
        );
        assert_eq!(effective_cost(&edge), Some((TransportMode::Road, dec!(4))));

        if let Some(rail) = edge.modes.get_mut(&TransportMode::Rail) {
            rail.available = true;
        }
        assert_eq!(effective_cost(&edge), Some((TransportMode::Rail, dec!(1))));
    }

    #[test]
    fn cheaper_pipeline_wins() {
        let mut edge = road_edge(dec!(4));
        lay_pipeline(&mut edge, pipeline(dec!(2)));
        assert_eq!(effective_cost(&edge), Some((TransportMode::Pipeline, dec!(2))));
    }

    #[test]
    fn equal_cost_prefers_road() {
        let mut edge = road_edge(dec!(4));
        lay_pipeline(&mut edge, pipeline(dec!(4)));
        assert_eq!(effective_cost(&edge), Some((TransportMode::Road, dec!(4))));
    }

    #[test]
    fn edge_with_nothing_usable_has_no_cost() {
        let mut edge = road_edge(dec!(4));
        if let Some(road) = edge.modes.get_mut(&TransportMode::Road) {
            road.available = false;
        }
        assert_eq!(effective_cost(&edge), None);
    }

    #[test]
    fn negative_cost_rejected() {
        let edge = road_edge(dec!(-1));
        assert!(matches!(
            validate(&edge),
            Err(WorldError::NegativeEdgeCost { .. })
        ));
    }

    #[test]
    fn pipeline_cost_scales_with_road() {
        let edge = road_edge(dec!(3));
        assert_eq!(pipeline_build_cost(&edge, dec!(200)), dec!(600));
        let cheap = road_edge(dec!(0.5));
        assert_eq!(pipeline_build_cost(&cheap, dec!(200)), dec!(200));
    }
}
