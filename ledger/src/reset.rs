//! Reset: the main wallet reopens a decided operation for voting.

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::state::LedgerState;
use authwallet_types::{OperationId, WalletAddress};

pub struct ResetManager;

impl ResetManager {
    /// Check whether `caller` may reset `operation_id`.
    ///
    /// Order: unknown id, caller not the main wallet, record still pending,
    /// record no longer the caller's current operation.
    pub fn check_reset(
        &self,
        state: &LedgerState,
        caller: &WalletAddress,
        operation_id: OperationId,
    ) -> Result<(), LedgerError> {
        let record = state.record(operation_id)?;
        if record.main_wallet != *caller {
            return Err(LedgerError::OnlyMainWalletCanReset {
                operation_id,
                caller: *caller,
            });
        }
        if !record.is_terminal() {
            return Err(LedgerError::OperationNotTerminal(operation_id));
        }
        // Reviving an operation the user has since replaced would leave them
        // with two live operations.
        match state.index.user_operation(caller) {
            Some(current) if current != operation_id => Err(LedgerError::OperationSuperseded {
                operation_id,
                current,
            }),
            _ => Ok(()),
        }
    }

    /// Clear votes and outcome, keeping id, main wallet, and auth wallets,
    /// and put the id back in all three pending sets.
    pub fn reset(
        &self,
        state: &mut LedgerState,
        caller: WalletAddress,
        operation_id: OperationId,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.check_reset(state, &caller, operation_id)?;

        let record = state.record_mut(operation_id)?;
        record.clear_votes();
        let record = record.clone();
        state.index.publish(&record);

        Ok(vec![LedgerEvent::AuthenticationReset {
            operation_id,
            main_wallet: caller,
        }])
    }
}
