//! The cash ledger: an append-only log of every money movement.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Sequenced**: each appended entry receives the next sequence number.
//! - **Two-sided**: every entry names a payer and a payee.
//! - **Precision**: all amounts use [`Decimal`], no floating point.

use oilnet_types::{EdgeId, LedgerEntry, LedgerEntryType, NodeId, Party, Player, PlayerId};
use rust_decimal::Decimal;

use crate::reconcile::{ReconcileResult, reconcile};
use crate::{LedgerError, TransactionBuilder};

// ---------------------------------------------------------------------------
// Entry parameters
// ---------------------------------------------------------------------------

/// Parameters for recording a general ledger entry.
pub struct EntryParams {
    /// Turn the movement belongs to.
    pub turn: u64,
    /// Category of movement.
    pub entry_type: LedgerEntryType,
    /// Player paying or being paid; the other side is the market.
    pub player: PlayerId,
    /// Cash amount.
    pub amount: Decimal,
    /// Machine-readable reason.
    pub reason: String,
    /// Related node, if any.
    pub node: Option<NodeId>,
    /// Related edge, if any.
    pub edge: Option<EdgeId>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Append-only record of every cash movement in a game.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
    /// Sequence number for the next appended entry.
    next_seq: u64,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Append an entry, stamping it with the next sequence number.
    ///
    /// A ledger created with [`Default`] starts numbering at one like
    /// [`Ledger::new`].
    pub fn append(&mut self, mut entry: LedgerEntry) {
        entry.seq = self.next_seq.max(1);
        self.next_seq = entry.seq.saturating_add(1);
        self.entries.push(entry);
    }

    /// Record a movement between a player and the market.
    ///
    /// The direction follows the entry type: income types pay the player,
    /// everything else charges them.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record(&mut self, params: EntryParams) -> Result<&LedgerEntry, LedgerError> {
        let player = Party::Player(params.player);
        let (from, to) = if params.entry_type.is_income() {
            (Party::Market, player)
        } else {
            (player, Party::Market)
        };

        let mut builder = TransactionBuilder::new(params.turn, params.entry_type)
            .from(from)
            .to(to)
            .amount(params.amount)
            .reason(params.reason);
        if let Some(node) = params.node {
            builder = builder.node(node);
        }
        if let Some(edge) = params.edge {
            builder = builder.edge(edge);
        }

        let entry = builder.build()?;
        self.append(entry);

        self.entries.last().ok_or(LedgerError::InternalError(
            "failed to retrieve entry after append",
        ))
    }

    /// Record sale proceeds paid to a player at a node.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_sale(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
        node: NodeId,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::Sale,
            player,
            amount,
            reason: reason.to_owned(),
            node: Some(node),
            edge: None,
        })
    }

    /// Record an operating cost charged to a player at a node.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_operating_cost(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
        node: NodeId,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::OperatingCost,
            player,
            amount,
            reason: reason.to_owned(),
            node: Some(node),
            edge: None,
        })
    }

    /// Record the processing fee charged to a refinery owner.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_processing_fee(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        node: NodeId,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::ProcessingFee,
            player,
            amount,
            reason: "PROCESSING_FEE".to_owned(),
            node: Some(node),
            edge: None,
        })
    }

    /// Record a pipeline fee earned by the pipeline owner.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_transport_fee(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        edge: EdgeId,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::TransportFee,
            player,
            amount,
            reason: "PIPELINE_FEE".to_owned(),
            node: None,
            edge: Some(edge),
        })
    }

    /// Record surplus crude exported from a well.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_export(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        well: NodeId,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::Export,
            player,
            amount,
            reason: "CRUDE_EXPORT".to_owned(),
            node: Some(well),
            edge: None,
        })
    }

    /// Record a construction payment for a node or edge asset.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_construction(
        &mut self,
        turn: u64,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
        node: Option<NodeId>,
        edge: Option<EdgeId>,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.record(EntryParams {
            turn,
            entry_type: LedgerEntryType::Construction,
            player,
            amount,
            reason: reason.to_owned(),
            node,
            edge,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Entries belonging to one turn, in insertion order.
    pub fn entries_for_turn(&self, turn: u64) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.turn == turn)
    }

    /// A player's operating result for a turn: income minus outgo,
    /// construction excluded.
    pub fn player_net(&self, turn: u64, player: PlayerId) -> Decimal {
        net_for(self.entries_for_turn(turn), player)
    }

    /// Total construction spending by a player over the whole game.
    pub fn capital_spent(&self, player: PlayerId) -> Decimal {
        self.entries
            .iter()
            .filter(|e| {
                e.entry_type == LedgerEntryType::Construction
                    && e.from == Party::Player(player)
            })
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
    }

    /// Check a turn's entries against the players' accumulators.
    pub fn reconcile<'a>(
        &self,
        turn: u64,
        players: impl IntoIterator<Item = &'a Player>,
    ) -> ReconcileResult {
        reconcile(turn, &self.entries, players)
    }
}

/// Operating net of `player` over `entries`.
pub(crate) fn net_for<'a>(
    entries: impl Iterator<Item = &'a LedgerEntry>,
    player: PlayerId,
) -> Decimal {
    let me = Party::Player(player);
    entries
        .filter(|e| e.entry_type.is_operating())
        .fold(Decimal::ZERO, |acc, e| {
            if e.to == me {
                acc.saturating_add(e.amount)
            } else if e.from == me {
                acc.saturating_sub(e.amount)
            } else {
                acc
            }
        })
}
