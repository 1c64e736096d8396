//! Lookup indices kept in lockstep with operation records.
//!
//! - user index: main wallet -> its most recent operation id
//! - pending index: auth wallet -> ids still awaiting that wallet's vote
//! - history index: auth wallet -> every id that ever named it (append-only)
//!
//! An id is in a wallet's pending set iff the wallet is one of the record's
//! auth wallets, has not voted, and the record is not terminal. Every change
//! goes through the methods here; nothing rebuilds the sets by scanning.

use crate::record::OperationRecord;
use authwallet_types::{OperationId, WalletAddress};
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug, Default)]
pub struct IndexMaintainer {
    users: HashMap<WalletAddress, OperationId>,
    pending: HashMap<WalletAddress, BTreeSet<OperationId>>,
    history: HashMap<WalletAddress, BTreeSet<OperationId>>,
}

impl IndexMaintainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `user` at `operation_id`, replacing any earlier operation.
    pub fn set_user_operation(&mut self, user: WalletAddress, operation_id: OperationId) {
        self.users.insert(user, operation_id);
    }

    pub fn user_operation(&self, user: &WalletAddress) -> Option<OperationId> {
        self.users.get(user).copied()
    }

    pub fn users(&self) -> impl Iterator<Item = (&WalletAddress, &OperationId)> {
        self.users.iter()
    }

    /// Remember that the record names each of its auth wallets. Entries are
    /// never removed.
    pub fn record_history(&mut self, record: &OperationRecord) {
        for wallet in &record.auth_wallets {
            self.history
                .entry(*wallet)
                .or_default()
                .insert(record.operation_id);
        }
    }

    /// Every id that named `wallet`, ascending.
    pub fn history_for(&self, wallet: &WalletAddress) -> Vec<OperationId> {
        self.history
            .get(wallet)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Add the record's id to the pending set of every auth wallet that has
    /// not voted on it. Used at registration and after a reset.
    pub fn publish(&mut self, record: &OperationRecord) {
        if record.is_terminal() {
            return;
        }
        for wallet in record.undecided_voters() {
            self.pending
                .entry(*wallet)
                .or_default()
                .insert(record.operation_id);
        }
    }

    /// Drop `operation_id` from one wallet's pending set once it has voted.
    pub fn retract_voter(&mut self, wallet: &WalletAddress, operation_id: OperationId) {
        if let Some(set) = self.pending.get_mut(wallet) {
            set.remove(&operation_id);
            if set.is_empty() {
                self.pending.remove(wallet);
            }
        }
    }

    /// Drop the record's id from all of its auth wallets' pending sets,
    /// voted or not. Used when the record becomes terminal.
    pub fn retract_all(&mut self, record: &OperationRecord) {
        for wallet in &record.auth_wallets {
            self.retract_voter(wallet, record.operation_id);
        }
    }

    /// Ids awaiting `wallet`'s vote, ascending.
    pub fn pending_for(&self, wallet: &WalletAddress) -> Vec<OperationId> {
        self.pending
            .get(wallet)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_pending_for(&self, wallet: &WalletAddress, operation_id: OperationId) -> bool {
        self.pending
            .get(wallet)
            .is_some_and(|set| set.contains(&operation_id))
    }

    /// Total number of (wallet, id) pending entries.
    pub fn pending_entry_count(&self) -> usize {
        self.pending.values().map(BTreeSet::len).sum()
    }
}
