//! Registration: a main wallet opens an operation with three auth wallets.

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::record::OperationRecord;
use crate::state::LedgerState;
use authwallet_types::{OperationId, OperationStatus, Timestamp, WalletAddress, AUTH_WALLET_COUNT};

pub struct RegistrationManager;

impl RegistrationManager {
    /// Check that the auth wallets are pairwise distinct and exclude the caller.
    pub fn validate_auth_set(
        &self,
        caller: &WalletAddress,
        auth_wallets: &[WalletAddress; AUTH_WALLET_COUNT],
    ) -> Result<(), LedgerError> {
        if auth_wallets.contains(caller) {
            return Err(LedgerError::InvalidAuthSet {
                reason: format!("main wallet {caller} cannot be its own auth wallet"),
            });
        }
        for (i, wallet) in auth_wallets.iter().enumerate() {
            if auth_wallets[i + 1..].contains(wallet) {
                return Err(LedgerError::InvalidAuthSet {
                    reason: format!("auth wallet {wallet} is listed more than once"),
                });
            }
        }
        Ok(())
    }

    /// Open a new operation for `caller`.
    ///
    /// A caller whose current operation was rejected may register again and
    /// gets a fresh id; a pending or authenticated operation blocks it.
    pub fn register(
        &self,
        state: &mut LedgerState,
        caller: WalletAddress,
        auth_wallets: [WalletAddress; AUTH_WALLET_COUNT],
        now: Timestamp,
    ) -> Result<(OperationId, Vec<LedgerEvent>), LedgerError> {
        self.validate_auth_set(&caller, &auth_wallets)?;

        if let Some(existing) = state.user_record(&caller) {
            if existing.status != OperationStatus::Rejected {
                return Err(LedgerError::AlreadyRegistered(caller));
            }
        }

        let operation_id = state.next_id()?;
        let record = OperationRecord::new(operation_id, caller, auth_wallets, now);

        state.index.record_history(&record);
        state.index.publish(&record);
        state.index.set_user_operation(caller, operation_id);
        state.records.insert(operation_id, record);
        state.last_id = Some(operation_id);

        let event = LedgerEvent::UserRegistered {
            operation_id,
            main_wallet: caller,
            auth_wallets,
        };
        Ok((operation_id, vec![event]))
    }
}
