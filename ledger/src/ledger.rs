//! The authentication ledger service.
//!
//! [`AuthLedger`] owns the operation table, both indices, the event log, and
//! metrics. Every mutating call runs as one unit of work under the write
//! lock: preconditions are checked first, then record, indices, metrics, and
//! event log change together, so a failed call leaves nothing behind and no
//! caller ever observes half an update. Queries take the read lock and copy
//! results out.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::events::{EventLog, EventRecord, LedgerEvent};
use crate::metrics::LedgerMetrics;
use crate::record::OperationRecord;
use crate::registration::RegistrationManager;
use crate::reset::ResetManager;
use crate::snapshot::LedgerSnapshot;
use crate::state::LedgerState;
use crate::voting::{VoteOutcome, VotingEngine};
use authwallet_types::{
    Clock, OperationId, OperationStatus, SystemClock, ThresholdParams, Timestamp, Vote,
    WalletAddress, AUTH_WALLET_COUNT,
};
use authwallet_utils::format_duration;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

struct Inner {
    state: LedgerState,
    events: EventLog,
}

pub struct AuthLedger {
    inner: RwLock<Inner>,
    registration: RegistrationManager,
    voting: VotingEngine,
    reset: ResetManager,
    metrics: Option<LedgerMetrics>,
    clock: Arc<dyn Clock>,
}

impl AuthLedger {
    /// An empty ledger using wall-clock time.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// An empty ledger stamping records and events with `clock`.
    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        Self::from_state(LedgerState::new(), config, clock)
    }

    /// Rebuild a ledger from a snapshot. The event log starts empty.
    pub fn restore(
        snapshot: LedgerSnapshot,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let state = snapshot.into_state(&config.thresholds)?;
        info!(
            operations = state.records.len(),
            "restored ledger from snapshot"
        );
        Self::from_state(state, config, clock)
    }

    fn from_state(
        state: LedgerState,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let metrics = config.enable_metrics.then(LedgerMetrics::new);
        if let Some(m) = &metrics {
            m.pending_operations
                .set(state.pending_operations().len() as i64);
        }
        Ok(Self {
            inner: RwLock::new(Inner {
                state,
                events: EventLog::new(),
            }),
            registration: RegistrationManager,
            voting: VotingEngine::new(config.thresholds),
            reset: ResetManager,
            metrics,
            clock,
        })
    }

    // Every check precedes the first mutation, and listener panics are
    // caught inside the event log, so a poisoned lock still guards
    // consistent state.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn refused(&self, call: &str, caller: &WalletAddress, err: &LedgerError) {
        if err.is_precondition() {
            warn!(call, %caller, error = %err, "call refused");
        } else {
            error!(call, %caller, error = %err, "call failed");
        }
        if let Some(m) = &self.metrics {
            m.failed_calls.with_label_values(&[err.kind()]).inc();
        }
    }

    fn commit(&self, log: &mut EventLog, events: Vec<LedgerEvent>, now: Timestamp) {
        let failed = log.commit(events, now);
        if failed > 0 {
            if let Some(m) = &self.metrics {
                m.listener_panics.inc_by(failed as u64);
            }
        }
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Open an operation for `caller` with three auth wallets.
    pub fn register(
        &self,
        caller: WalletAddress,
        auth_wallets: [WalletAddress; AUTH_WALLET_COUNT],
    ) -> Result<OperationId, LedgerError> {
        let mut inner = self.write();
        let now = self.clock.now();
        let (operation_id, events) = self
            .registration
            .register(&mut inner.state, caller, auth_wallets, now)
            .inspect_err(|e| self.refused("register", &caller, e))?;

        info!(%operation_id, %caller, "operation registered");
        if let Some(m) = &self.metrics {
            m.registrations.inc();
            m.pending_operations.inc();
        }
        self.commit(&mut inner.events, events, now);
        Ok(operation_id)
    }

    pub fn approve(
        &self,
        caller: WalletAddress,
        operation_id: OperationId,
    ) -> Result<(), LedgerError> {
        self.vote(caller, operation_id, Vote::Approve).map(|_| ())
    }

    pub fn reject(
        &self,
        caller: WalletAddress,
        operation_id: OperationId,
    ) -> Result<(), LedgerError> {
        self.vote(caller, operation_id, Vote::Reject).map(|_| ())
    }

    /// Cast a vote and report what it did to the operation.
    pub fn vote(
        &self,
        caller: WalletAddress,
        operation_id: OperationId,
        vote: Vote,
    ) -> Result<VoteOutcome, LedgerError> {
        let mut inner = self.write();
        let now = self.clock.now();
        let (outcome, events) = self
            .voting
            .cast(&mut inner.state, caller, operation_id, vote, now)
            .inspect_err(|e| self.refused(vote.as_str(), &caller, e))?;

        debug!(
            %operation_id,
            %caller,
            vote = vote.as_str(),
            approvals = outcome.approval_count,
            rejections = outcome.rejection_count,
            "vote recorded"
        );
        if let Some(m) = &self.metrics {
            m.votes.with_label_values(&[vote.as_str()]).inc();
        }
        if let Some(status) = outcome.decided {
            let record = inner.state.record(operation_id)?;
            let started = record.created_at;
            let took = started.elapsed_since(now);
            info!(
                %operation_id,
                main_wallet = %record.main_wallet,
                outcome = status.as_str(),
                after = %format_duration(took),
                "operation decided"
            );
            if let Some(m) = &self.metrics {
                m.decisions.with_label_values(&[status.as_str()]).inc();
                m.pending_operations.dec();
                m.decision_latency_secs.observe(took as f64);
            }
        }
        self.commit(&mut inner.events, events, now);
        Ok(outcome)
    }

    /// Reopen a decided operation for voting. Only its main wallet may.
    pub fn reset(
        &self,
        caller: WalletAddress,
        operation_id: OperationId,
    ) -> Result<(), LedgerError> {
        let mut inner = self.write();
        self.reset_locked(&mut inner, caller, operation_id)
    }

    /// Reset whatever operation `caller` currently owns.
    pub fn reset_for_user(&self, caller: WalletAddress) -> Result<OperationId, LedgerError> {
        let mut inner = self.write();
        let operation_id = match inner.state.index.user_operation(&caller) {
            Some(id) => id,
            None => {
                let err = LedgerError::NotRegistered(caller);
                self.refused("reset", &caller, &err);
                return Err(err);
            }
        };
        self.reset_locked(&mut inner, caller, operation_id)?;
        Ok(operation_id)
    }

    fn reset_locked(
        &self,
        inner: &mut Inner,
        caller: WalletAddress,
        operation_id: OperationId,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let events = self
            .reset
            .reset(&mut inner.state, caller, operation_id)
            .inspect_err(|e| self.refused("reset", &caller, e))?;

        info!(%operation_id, %caller, "operation reset");
        if let Some(m) = &self.metrics {
            m.resets.inc();
            m.pending_operations.inc();
        }
        self.commit(&mut inner.events, events, now);
        Ok(())
    }

    /// Register a callback for every committed event.
    ///
    /// Callbacks run while the write lock is held and must not call back
    /// into the ledger.
    pub fn subscribe(&self, listener: impl Fn(&EventRecord) + Send + Sync + 'static) {
        self.write().events.subscribe(Box::new(listener));
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_operation(
        &self,
        operation_id: OperationId,
    ) -> Result<OperationRecord, LedgerError> {
        self.read().state.record(operation_id).cloned()
    }

    /// The most recent operation `user` registered.
    pub fn get_user_operation(&self, user: &WalletAddress) -> Option<OperationId> {
        self.read().state.index.user_operation(user)
    }

    /// The record of `user`'s most recent operation.
    pub fn get_user_data(&self, user: &WalletAddress) -> Option<OperationRecord> {
        self.read().state.user_record(user).cloned()
    }

    /// Operations awaiting `auth_wallet`'s vote, ascending by id.
    pub fn get_pending_for_auth_wallet(&self, auth_wallet: &WalletAddress) -> Vec<OperationId> {
        self.read().state.index.pending_for(auth_wallet)
    }

    /// Every operation that ever named `auth_wallet`, decided or not,
    /// ascending by id.
    pub fn get_auth_wallet_operations(&self, auth_wallet: &WalletAddress) -> Vec<OperationId> {
        self.read().state.index.history_for(auth_wallet)
    }

    /// Every undecided operation, ascending by id.
    pub fn get_all_pending_operations(&self) -> Vec<OperationId> {
        self.read().state.pending_operations()
    }

    pub fn is_authenticated(&self, user: &WalletAddress) -> bool {
        self.user_status(user) == Some(OperationStatus::Authenticated)
    }

    pub fn is_rejected(&self, user: &WalletAddress) -> bool {
        self.user_status(user) == Some(OperationStatus::Rejected)
    }

    /// Whether `user`'s operation has collected enough approvals.
    pub fn is_threshold_met(&self, user: &WalletAddress) -> bool {
        let threshold = self.voting.thresholds().approval_threshold;
        self.read()
            .state
            .user_record(user)
            .is_some_and(|r| r.approval_count() >= threshold)
    }

    fn user_status(&self, user: &WalletAddress) -> Option<OperationStatus> {
        self.read().state.user_record(user).map(|r| r.status)
    }

    /// Approvals on `user`'s operation, 0 if unregistered.
    pub fn approval_count(&self, user: &WalletAddress) -> u32 {
        self.read()
            .state
            .user_record(user)
            .map_or(0, OperationRecord::approval_count)
    }

    /// Rejections on `user`'s operation, 0 if unregistered.
    pub fn rejection_count(&self, user: &WalletAddress) -> u32 {
        self.read()
            .state
            .user_record(user)
            .map_or(0, OperationRecord::rejection_count)
    }

    /// The vote `auth_wallet` cast on `operation_id`, if any.
    pub fn vote_of(
        &self,
        operation_id: OperationId,
        auth_wallet: &WalletAddress,
    ) -> Result<Option<Vote>, LedgerError> {
        let inner = self.read();
        let record = inner.state.record(operation_id)?;
        let slot = record
            .slot_of(auth_wallet)
            .ok_or(LedgerError::NotAnAuthWallet {
                operation_id,
                wallet: *auth_wallet,
            })?;
        Ok(record.votes[slot])
    }

    pub fn has_approved(
        &self,
        operation_id: OperationId,
        auth_wallet: &WalletAddress,
    ) -> Result<bool, LedgerError> {
        Ok(self.vote_of(operation_id, auth_wallet)? == Some(Vote::Approve))
    }

    pub fn has_rejected(
        &self,
        operation_id: OperationId,
        auth_wallet: &WalletAddress,
    ) -> Result<bool, LedgerError> {
        Ok(self.vote_of(operation_id, auth_wallet)? == Some(Vote::Reject))
    }

    pub fn thresholds(&self) -> ThresholdParams {
        *self.voting.thresholds()
    }

    /// Most recently allocated id, `None` before the first registration.
    pub fn last_operation_id(&self) -> Option<OperationId> {
        self.read().state.last_id
    }

    pub fn operation_count(&self) -> usize {
        self.read().state.records.len()
    }

    /// Committed events with a sequence number greater than `after`.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.read().events.since(after)
    }

    /// Sequence number of the newest committed event, 0 when none.
    pub fn last_event_sequence(&self) -> u64 {
        self.read().events.last_sequence()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.read().state, self.clock.now())
    }

    pub fn metrics(&self) -> Option<&LedgerMetrics> {
        self.metrics.as_ref()
    }
}

impl std::fmt::Debug for AuthLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthLedger")
            .field("thresholds", self.voting.thresholds())
            .field("operations", &self.operation_count())
            .finish()
    }
}
