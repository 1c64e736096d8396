//! The canonical operation table and its indices.

use crate::error::LedgerError;
use crate::index::IndexMaintainer;
use crate::record::OperationRecord;
use authwallet_types::{OperationId, WalletAddress};
use std::collections::BTreeMap;

/// Everything a mutating call reads and writes as one unit.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub(crate) records: BTreeMap<OperationId, OperationRecord>,
    pub(crate) index: IndexMaintainer,
    /// Most recently allocated id; `None` before the first registration.
    pub(crate) last_id: Option<OperationId>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation_id: OperationId) -> Result<&OperationRecord, LedgerError> {
        self.records
            .get(&operation_id)
            .ok_or(LedgerError::UnknownOperation(operation_id))
    }

    pub(crate) fn record_mut(
        &mut self,
        operation_id: OperationId,
    ) -> Result<&mut OperationRecord, LedgerError> {
        self.records
            .get_mut(&operation_id)
            .ok_or(LedgerError::UnknownOperation(operation_id))
    }

    /// The record `user` currently points at, if any.
    pub fn user_record(&self, user: &WalletAddress) -> Option<&OperationRecord> {
        self.index
            .user_operation(user)
            .and_then(|id| self.records.get(&id))
    }

    /// Id the next registration will receive.
    pub(crate) fn next_id(&self) -> Result<OperationId, LedgerError> {
        match self.last_id {
            None => Ok(OperationId::FIRST),
            Some(last) => last.next().ok_or(LedgerError::OperationIdsExhausted),
        }
    }

    pub fn pending_operations(&self) -> Vec<OperationId> {
        self.records
            .values()
            .filter(|r| !r.is_terminal())
            .map(|r| r.operation_id)
            .collect()
    }

    pub fn index(&self) -> &IndexMaintainer {
        &self.index
    }
}
