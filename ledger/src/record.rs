//! The operation record: one authentication request and its vote ledger.

use authwallet_types::{
    OperationId, OperationStatus, ThresholdParams, Timestamp, Vote, WalletAddress,
    AUTH_WALLET_COUNT,
};
use serde::{Deserialize, Serialize};

/// One authentication request.
///
/// Tallies are derived from `votes`, so counters can never drift from the
/// anti-replay ledger. `status` is a single enum, so a record is never both
/// authenticated and rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: OperationId,
    pub main_wallet: WalletAddress,
    pub auth_wallets: [WalletAddress; AUTH_WALLET_COUNT],
    /// Vote slot per auth wallet, aligned with `auth_wallets`.
    pub votes: [Option<Vote>; AUTH_WALLET_COUNT],
    pub status: OperationStatus,
    pub created_at: Timestamp,
    /// When the record last became terminal; cleared by a reset.
    pub decided_at: Option<Timestamp>,
    /// How many times the main wallet has reset this record.
    pub reset_count: u32,
}

impl OperationRecord {
    /// A fresh, undecided record with an empty vote ledger.
    pub fn new(
        operation_id: OperationId,
        main_wallet: WalletAddress,
        auth_wallets: [WalletAddress; AUTH_WALLET_COUNT],
        created_at: Timestamp,
    ) -> Self {
        Self {
            operation_id,
            main_wallet,
            auth_wallets,
            votes: [None; AUTH_WALLET_COUNT],
            status: OperationStatus::Pending,
            created_at,
            decided_at: None,
            reset_count: 0,
        }
    }

    /// Position of `wallet` among the auth wallets, if it is one.
    pub fn slot_of(&self, wallet: &WalletAddress) -> Option<usize> {
        self.auth_wallets.iter().position(|w| w == wallet)
    }

    pub fn is_auth_wallet(&self, wallet: &WalletAddress) -> bool {
        self.slot_of(wallet).is_some()
    }

    /// The vote `wallet` has cast, or `None` if it has not voted or is not an
    /// auth wallet of this record.
    pub fn vote_of(&self, wallet: &WalletAddress) -> Option<Vote> {
        self.slot_of(wallet).and_then(|slot| self.votes[slot])
    }

    pub fn approval_count(&self) -> u32 {
        self.count(Vote::Approve)
    }

    pub fn rejection_count(&self) -> u32 {
        self.count(Vote::Reject)
    }

    fn count(&self, kind: Vote) -> u32 {
        self.votes.iter().filter(|v| **v == Some(kind)).count() as u32
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == OperationStatus::Authenticated
    }

    pub fn is_rejected(&self) -> bool {
        self.status == OperationStatus::Rejected
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Auth wallets that have not cast a vote yet.
    pub fn undecided_voters(&self) -> impl Iterator<Item = &WalletAddress> {
        self.auth_wallets
            .iter()
            .zip(self.votes.iter())
            .filter(|(_, vote)| vote.is_none())
            .map(|(wallet, _)| wallet)
    }

    /// The terminal status the current tallies call for, if any.
    pub(crate) fn outcome(&self, thresholds: &ThresholdParams) -> Option<OperationStatus> {
        if self.approval_count() >= thresholds.approval_threshold {
            Some(OperationStatus::Authenticated)
        } else if self.rejection_count() >= thresholds.rejection_threshold {
            Some(OperationStatus::Rejected)
        } else {
            None
        }
    }

    /// Back to a fresh, undecided record. Identity fields are untouched.
    pub(crate) fn clear_votes(&mut self) {
        self.votes = [None; AUTH_WALLET_COUNT];
        self.status = OperationStatus::Pending;
        self.decided_at = None;
        self.reset_count += 1;
    }
}
