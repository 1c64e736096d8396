//! Voting: auth wallets approve or reject an operation, once each.

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::state::LedgerState;
use authwallet_types::{OperationId, OperationStatus, ThresholdParams, Timestamp, Vote, WalletAddress};

/// What a successful vote did to its operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    pub operation_id: OperationId,
    pub approval_count: u32,
    pub rejection_count: u32,
    /// The terminal status reached on this vote, if any.
    pub decided: Option<OperationStatus>,
}

/// Records votes and applies the configured thresholds.
pub struct VotingEngine {
    thresholds: ThresholdParams,
}

impl VotingEngine {
    pub fn new(thresholds: ThresholdParams) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdParams {
        &self.thresholds
    }

    /// Check whether `caller` may vote on `operation_id` right now.
    ///
    /// Checks run in a fixed order and the first failure wins: unknown id,
    /// caller not an auth wallet, operation already decided, caller already
    /// voted.
    pub fn check_vote(
        &self,
        state: &LedgerState,
        caller: &WalletAddress,
        operation_id: OperationId,
    ) -> Result<usize, LedgerError> {
        let record = state.record(operation_id)?;
        let slot = record
            .slot_of(caller)
            .ok_or(LedgerError::NotAnAuthWallet {
                operation_id,
                wallet: *caller,
            })?;
        if record.is_terminal() {
            return Err(LedgerError::OperationNotActive(operation_id));
        }
        if record.votes[slot].is_some() {
            return Err(LedgerError::AlreadyVoted {
                operation_id,
                wallet: *caller,
            });
        }
        Ok(slot)
    }

    /// Cast `vote` for `caller`.
    ///
    /// Nothing is modified unless every check passes. When the vote crosses
    /// a threshold the operation becomes terminal and leaves every pending
    /// set, including those of wallets that never voted.
    pub fn cast(
        &self,
        state: &mut LedgerState,
        caller: WalletAddress,
        operation_id: OperationId,
        vote: Vote,
        now: Timestamp,
    ) -> Result<(VoteOutcome, Vec<LedgerEvent>), LedgerError> {
        let slot = self.check_vote(state, &caller, operation_id)?;

        let record = state.record_mut(operation_id)?;
        record.votes[slot] = Some(vote);
        let decided = record.outcome(&self.thresholds);
        if let Some(status) = decided {
            record.status = status;
            record.decided_at = Some(now);
        }
        let record = record.clone();

        state.index.retract_voter(&caller, operation_id);
        if decided.is_some() {
            state.index.retract_all(&record);
        }

        let mut events = vec![match vote {
            Vote::Approve => LedgerEvent::ApprovalGranted {
                operation_id,
                auth_wallet: caller,
            },
            Vote::Reject => LedgerEvent::RejectionGranted {
                operation_id,
                auth_wallet: caller,
            },
        }];
        match decided {
            Some(OperationStatus::Authenticated) => events.push(LedgerEvent::UserAuthenticated {
                operation_id,
                main_wallet: record.main_wallet,
            }),
            Some(OperationStatus::Rejected) => events.push(LedgerEvent::UserRejected {
                operation_id,
                main_wallet: record.main_wallet,
            }),
            _ => {}
        }

        let outcome = VoteOutcome {
            operation_id,
            approval_count: record.approval_count(),
            rejection_count: record.rejection_count(),
            decided,
        };
        Ok((outcome, events))
    }
}
