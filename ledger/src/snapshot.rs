//! Ledger snapshots. Capture every operation record and the user index so
//! a ledger can be persisted and restored.
//!
//! The pending and history indices are not stored: on restore they are
//! republished from the records through the index maintainer. The snapshot
//! hash is computed deterministically from the contents so corruption is
//! detected on load.

use crate::error::LedgerError;
use crate::index::IndexMaintainer;
use crate::record::OperationRecord;
use crate::registration::RegistrationManager;
use crate::state::LedgerState;
use authwallet_types::{OperationId, ThresholdParams, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 of the contents (excluding `created_at`).
    pub hash: [u8; 32],
    pub version: u32,
    pub created_at: Timestamp,
    /// Most recently allocated id.
    pub last_id: Option<OperationId>,
    /// Records in ascending id order.
    pub records: Vec<OperationRecord>,
    /// Main wallet -> current operation, sorted by wallet.
    pub users: Vec<(WalletAddress, OperationId)>,
}

impl LedgerSnapshot {
    pub(crate) fn capture(state: &LedgerState, created_at: Timestamp) -> Self {
        let mut users: Vec<(WalletAddress, OperationId)> =
            state.index.users().map(|(w, id)| (*w, *id)).collect();
        users.sort();
        let mut snap = Self {
            hash: [0u8; 32],
            version: SNAPSHOT_VERSION,
            created_at,
            last_id: state.last_id,
            records: state.records.values().cloned().collect(),
            users,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.last_id.map_or(0, |id| id.as_u64()).to_le_bytes());
        for record in &self.records {
            hasher.update(record.operation_id.as_u64().to_le_bytes());
            hasher.update(record.main_wallet.as_bytes());
            for wallet in &record.auth_wallets {
                hasher.update(wallet.as_bytes());
            }
            for vote in &record.votes {
                let tag: u8 = match vote {
                    None => 0,
                    Some(authwallet_types::Vote::Approve) => 1,
                    Some(authwallet_types::Vote::Reject) => 2,
                };
                hasher.update([tag]);
            }
            hasher.update(record.status.as_str().as_bytes());
            hasher.update(record.created_at.as_secs().to_le_bytes());
            hasher.update(record.decided_at.map_or(0, |t| t.as_secs()).to_le_bytes());
            hasher.update(record.reset_count.to_le_bytes());
        }
        for (wallet, id) in &self.users {
            hasher.update(wallet.as_bytes());
            hasher.update(id.as_u64().to_le_bytes());
        }

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Verify the snapshot hash matches the contents.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Rebuild ledger state, rejecting anything inconsistent.
    ///
    /// Records are checked against `thresholds` as well as the hash: a
    /// record whose status disagrees with its votes would leave its user
    /// unable to vote, reset, or register again.
    pub(crate) fn into_state(
        self,
        thresholds: &ThresholdParams,
    ) -> Result<LedgerState, LedgerError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if !self.verify() {
            return Err(LedgerError::Snapshot("hash mismatch".into()));
        }

        let mut state = LedgerState::new();
        for record in self.records {
            let id = record.operation_id;
            if id < OperationId::FIRST || self.last_id.map_or(true, |last| id > last) {
                return Err(LedgerError::Snapshot(format!(
                    "operation {id} is outside the allocated id range"
                )));
            }
            check_record(&record, thresholds)?;
            if state.records.insert(id, record).is_some() {
                return Err(LedgerError::Snapshot(format!("operation {id} appears twice")));
            }
        }

        let mut index = IndexMaintainer::new();
        for (user, id) in self.users {
            match state.records.get(&id) {
                Some(record) if record.main_wallet == user => {
                    index.set_user_operation(user, id);
                }
                _ => {
                    return Err(LedgerError::Snapshot(format!(
                        "user {user} points at operation {id} it does not own"
                    )));
                }
            }
        }
        for record in state.records.values() {
            let current = index.user_operation(&record.main_wallet);
            let stale = match current {
                None => true,
                Some(current) => current < record.operation_id,
            };
            if stale || (!record.is_terminal() && current != Some(record.operation_id)) {
                return Err(LedgerError::Snapshot(format!(
                    "operation {} is not tracked by its main wallet {}",
                    record.operation_id, record.main_wallet
                )));
            }
            index.record_history(record);
            index.publish(record);
        }

        state.index = index;
        state.last_id = self.last_id;
        Ok(state)
    }
}

/// A record must have a registrable auth set, a status its votes justify,
/// and a decision time exactly when it is decided.
fn check_record(
    record: &OperationRecord,
    thresholds: &ThresholdParams,
) -> Result<(), LedgerError> {
    let id = record.operation_id;
    RegistrationManager
        .validate_auth_set(&record.main_wallet, &record.auth_wallets)
        .map_err(|e| LedgerError::Snapshot(format!("operation {id}: {e}")))?;

    let expected = record.status.is_terminal().then_some(record.status);
    if record.outcome(thresholds) != expected {
        return Err(LedgerError::Snapshot(format!(
            "operation {id} is {} with {} approvals and {} rejections",
            record.status,
            record.approval_count(),
            record.rejection_count()
        )));
    }
    if record.decided_at.is_some() != record.is_terminal() {
        return Err(LedgerError::Snapshot(format!(
            "operation {id} has a decision time that does not match its status"
        )));
    }
    Ok(())
}
