//! Per-turn reconciliation of the ledger against player accumulators.
//!
//! The resolver credits and charges players directly and records a ledger
//! entry for each movement. At the end of every turn, for each player:
//!
//! ```text
//! sum(operating income in T) - sum(operating outgo in T) == turn_profit
//! ```
//!
//! Construction is excluded on both sides: it is paid from cash at command
//! time and never enters turn profit. A mismatch means a settlement path
//! moved cash without recording it (or the reverse) and is reported as a
//! [`ReconcileAnomaly`].

use std::collections::BTreeMap;

use oilnet_types::{LedgerEntry, Player};
use tracing::warn;

use crate::ReconcileAnomaly;
use crate::ledger::net_for;

/// The result of reconciling a single turn.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReconcileResult {
    /// Every player's ledger net matches their reported profit.
    Balanced,
    /// At least one player disagrees.
    Anomaly(ReconcileAnomaly),
}

impl ReconcileResult {
    /// Whether the turn reconciled.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Reconcile `turn` for every player in `players`.
pub fn reconcile<'a>(
    turn: u64,
    entries: &[LedgerEntry],
    players: impl IntoIterator<Item = &'a Player>,
) -> ReconcileResult {
    let mut mismatches = BTreeMap::new();

    for player in players {
        let ledger_net = net_for(entries.iter().filter(|e| e.turn == turn), player.id);
        if ledger_net != player.turn_profit {
            warn!(
                turn,
                player = %player.id,
                ledger_net = %ledger_net,
                reported = %player.turn_profit,
                "ledger does not match player profit"
            );
            mismatches.insert(player.id, (ledger_net, player.turn_profit));
        }
    }

    if mismatches.is_empty() {
        return ReconcileResult::Balanced;
    }

    let players: Vec<String> = mismatches.keys().map(ToString::to_string).collect();
    ReconcileResult::Anomaly(ReconcileAnomaly {
        turn,
        message: format!(
            "LEDGER_ANOMALY at turn {turn}: {} player(s) out of balance: {}",
            mismatches.len(),
            players.join(", ")
        ),
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use oilnet_types::{NodeId, PlayerId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::Ledger;

    fn settled(id: u32, revenue: Decimal, cost: Decimal) -> Player {
        let mut player = Player::new(PlayerId::new(id), format!("P{id}"), dec!(10000));
        player.earn(revenue);
        player.charge(cost);
        player.turn_profit = revenue - cost;
        player
    }

    #[test]
    fn empty_turn_with_idle_players_balances() {
        let ledger = Ledger::new();
        let idle = settled(1, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(ledger.reconcile(1, [&idle]), ReconcileResult::Balanced);
    }

    #[test]
    fn matching_entries_balance() {
        let mut ledger = Ledger::new();
        let well = NodeId::new(0);
        ledger
            .record_sale(1, PlayerId::new(1), dec!(550), "CRUDE_SALE", well)
            .ok();
        ledger
            .record_operating_cost(1, PlayerId::new(1), dec!(1000), "LIFTING", well)
            .ok();
        let player = settled(1, dec!(550), dec!(1000));
        assert!(ledger.reconcile(1, [&player]).is_balanced());
    }

    #[test]
    fn unrecorded_revenue_is_an_anomaly() {
        let mut ledger = Ledger::new();
        ledger
            .record_sale(1, PlayerId::new(1), dec!(100), "CRUDE_SALE", NodeId::new(0))
            .ok();
        let honest = settled(1, dec!(100), Decimal::ZERO);
        let padded = settled(2, dec!(50), Decimal::ZERO);

        let result = reconcile(1, ledger.entries(), [&honest, &padded]);
        let ReconcileResult::Anomaly(anomaly) = result else {
            assert!(matches!(result, ReconcileResult::Anomaly(_)));
            return;
        };
        assert_eq!(anomaly.turn, 1);
        assert_eq!(anomaly.mismatches.len(), 1);
        assert_eq!(
            anomaly.mismatches.get(&PlayerId::new(2)),
            Some(&(Decimal::ZERO, dec!(50)))
        );
        assert!(anomaly.message.contains("p2"));
    }

    #[test]
    fn construction_does_not_count_against_profit() {
        let mut ledger = Ledger::new();
        ledger
            .record_construction(1, PlayerId::new(1), dec!(5000), "BUILD_WELL", None, None)
            .ok();
        let idle = settled(1, Decimal::ZERO, Decimal::ZERO);
        assert!(ledger.reconcile(1, [&idle]).is_balanced());
    }
}
