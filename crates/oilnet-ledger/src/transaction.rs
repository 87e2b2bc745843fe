//! Validated construction of ledger entries.
//!
//! Every entry must name both parties, carry a strictly positive amount,
//! and respect the direction implied by its [`LedgerEntryType`]: income
//! types flow from the market to a player, everything else from a player
//! to the market.

use oilnet_types::{EdgeId, LedgerEntry, LedgerEntryType, NodeId, Party};
use rust_decimal::Decimal;

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`LedgerEntry`] values.
///
/// The built entry carries sequence number zero; [`Ledger`] assigns the
/// real one on append.
///
/// [`Ledger`]: crate::Ledger
///
/// # Examples
///
/// ```
/// use oilnet_ledger::TransactionBuilder;
/// use oilnet_types::{LedgerEntryType, Party, PlayerId};
/// use rust_decimal::Decimal;
///
/// let entry = TransactionBuilder::new(1, LedgerEntryType::Sale)
///     .from(Party::Market)
///     .to(Party::Player(PlayerId::new(1)))
///     .amount(Decimal::new(550, 0))
///     .reason("CRUDE_SALE")
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    turn: u64,
    entry_type: LedgerEntryType,
    from: Option<Party>,
    to: Option<Party>,
    amount: Option<Decimal>,
    reason: Option<String>,
    node: Option<NodeId>,
    edge: Option<EdgeId>,
}

impl TransactionBuilder {
    /// Start building an entry for the given turn and type.
    pub const fn new(turn: u64, entry_type: LedgerEntryType) -> Self {
        Self {
            turn,
            entry_type,
            from: None,
            to: None,
            amount: None,
            reason: None,
            node: None,
            edge: None,
        }
    }

    /// Set the paying party.
    #[must_use]
    pub const fn from(mut self, party: Party) -> Self {
        self.from = Some(party);
        self
    }

    /// Set the receiving party.
    #[must_use]
    pub const fn to(mut self, party: Party) -> Self {
        self.to = Some(party);
        self
    }

    /// Set the cash amount.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the machine-readable reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Link the entry to a node.
    #[must_use]
    pub const fn node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Link the entry to an edge.
    #[must_use]
    pub const fn edge(mut self, edge: EdgeId) -> Self {
        self.edge = Some(edge);
        self
    }

    /// Validate inputs and produce a [`LedgerEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if a party, amount or reason is
    /// unset, [`LedgerError::ZeroAmount`] or [`LedgerError::NegativeAmount`]
    /// for a non-positive amount, and [`LedgerError::InvalidParty`] if the
    /// direction does not match the entry type.
    pub fn build(self) -> Result<LedgerEntry, LedgerError> {
        let from = self.from.ok_or(LedgerError::MissingField("from"))?;
        let to = self.to.ok_or(LedgerError::MissingField("to"))?;
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let reason = self.reason.ok_or(LedgerError::MissingField("reason"))?;

        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { amount });
        }

        validate_parties(self.entry_type, from, to)?;

        Ok(LedgerEntry {
            seq: 0,
            turn: self.turn,
            entry_type: self.entry_type,
            from,
            to,
            amount,
            reason,
            node: self.node,
            edge: self.edge,
        })
    }
}

// ---------------------------------------------------------------------------
// Party validation
// ---------------------------------------------------------------------------

fn describe(party: Party) -> String {
    match party {
        Party::Player(id) => format!("player {id}"),
        Party::Market => "market".to_owned(),
    }
}

fn expect_player(
    entry_type: LedgerEntryType,
    side: &'static str,
    party: Party,
) -> Result<(), LedgerError> {
    if party.player().is_some() {
        Ok(())
    } else {
        Err(LedgerError::InvalidParty {
            entry_type,
            side,
            expected: "player",
            actual: describe(party),
        })
    }
}

fn expect_market(
    entry_type: LedgerEntryType,
    side: &'static str,
    party: Party,
) -> Result<(), LedgerError> {
    if party == Party::Market {
        Ok(())
    } else {
        Err(LedgerError::InvalidParty {
            entry_type,
            side,
            expected: "market",
            actual: describe(party),
        })
    }
}

/// Check the direction of an entry against its type.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidParty`] naming the first side that is wrong.
pub fn validate_parties(
    entry_type: LedgerEntryType,
    from: Party,
    to: Party,
) -> Result<(), LedgerError> {
    if entry_type.is_income() {
        expect_market(entry_type, "from", from)?;
        expect_player(entry_type, "to", to)
    } else {
        expect_player(entry_type, "from", from)?;
        expect_market(entry_type, "to", to)
    }
}

#[cfg(test)]
mod tests {
    use oilnet_types::PlayerId;
    use rust_decimal_macros::dec;

    use super::*;

    fn alice() -> Party {
        Party::Player(PlayerId::new(1))
    }

    #[test]
    fn valid_sale_builds() {
        let entry = TransactionBuilder::new(3, LedgerEntryType::Sale)
            .from(Party::Market)
            .to(alice())
            .amount(dec!(400))
            .reason("REFINED_MARGIN")
            .node(NodeId::new(2))
            .build();
        assert!(entry.is_ok());
        let entry = entry.ok();
        assert_eq!(entry.as_ref().map(|e| e.turn), Some(3));
        assert_eq!(entry.as_ref().and_then(|e| e.node), Some(NodeId::new(2)));
        assert_eq!(entry.map(|e| e.seq), Some(0));
    }

    #[test]
    fn zero_amount_rejected() {
        let result = TransactionBuilder::new(1, LedgerEntryType::OperatingCost)
            .from(alice())
            .to(Party::Market)
            .amount(Decimal::ZERO)
            .reason("LIFTING")
            .build();
        assert!(matches!(result, Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn negative_amount_rejected() {
        let result = TransactionBuilder::new(1, LedgerEntryType::OperatingCost)
            .from(alice())
            .to(Party::Market)
            .amount(dec!(-5))
            .reason("LIFTING")
            .build();
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn missing_reason_rejected() {
        let result = TransactionBuilder::new(1, LedgerEntryType::Sale)
            .from(Party::Market)
            .to(alice())
            .amount(dec!(1))
            .build();
        assert!(matches!(result, Err(LedgerError::MissingField("reason"))));
    }

    #[test]
    fn income_must_come_from_market() {
        let result = TransactionBuilder::new(1, LedgerEntryType::TransportFee)
            .from(Party::Player(PlayerId::new(2)))
            .to(alice())
            .amount(dec!(10))
            .reason("PIPELINE_FEE")
            .build();
        assert!(matches!(
            result,
            Err(LedgerError::InvalidParty { side: "from", .. })
        ));
    }

    #[test]
    fn costs_must_go_to_market() {
        let result = TransactionBuilder::new(1, LedgerEntryType::Construction)
            .from(alice())
            .to(alice())
            .amount(dec!(10))
            .reason("BUILD_WELL")
            .build();
        assert!(matches!(
            result,
            Err(LedgerError::InvalidParty { side: "to", .. })
        ));
    }
}
