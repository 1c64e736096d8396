//! Events committed by the ledger, for external indexers and observers.

use authwallet_types::{OperationId, Timestamp, WalletAddress, AUTH_WALLET_COUNT};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Something that happened to an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    UserRegistered {
        operation_id: OperationId,
        main_wallet: WalletAddress,
        auth_wallets: [WalletAddress; AUTH_WALLET_COUNT],
    },
    ApprovalGranted {
        operation_id: OperationId,
        auth_wallet: WalletAddress,
    },
    RejectionGranted {
        operation_id: OperationId,
        auth_wallet: WalletAddress,
    },
    UserAuthenticated {
        operation_id: OperationId,
        main_wallet: WalletAddress,
    },
    UserRejected {
        operation_id: OperationId,
        main_wallet: WalletAddress,
    },
    AuthenticationReset {
        operation_id: OperationId,
        main_wallet: WalletAddress,
    },
}

impl LedgerEvent {
    pub fn operation_id(&self) -> OperationId {
        match self {
            Self::UserRegistered { operation_id, .. }
            | Self::ApprovalGranted { operation_id, .. }
            | Self::RejectionGranted { operation_id, .. }
            | Self::UserAuthenticated { operation_id, .. }
            | Self::UserRejected { operation_id, .. }
            | Self::AuthenticationReset { operation_id, .. } => *operation_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "UserRegistered",
            Self::ApprovalGranted { .. } => "ApprovalGranted",
            Self::RejectionGranted { .. } => "RejectionGranted",
            Self::UserAuthenticated { .. } => "UserAuthenticated",
            Self::UserRejected { .. } => "UserRejected",
            Self::AuthenticationReset { .. } => "AuthenticationReset",
        }
    }
}

/// A committed event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Gapless, starting at 1, in commit order.
    pub sequence: u64,
    pub committed_at: Timestamp,
    pub event: LedgerEvent,
}

type Listener = Box<dyn Fn(&EventRecord) + Send + Sync>;

/// Append-only event log with synchronous fan-out to listeners.
///
/// Listeners run inline on the committing thread while the ledger's write
/// lock is held; keep handlers fast and never call back into the ledger.
#[derive(Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    listeners: Vec<Listener>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Append events in order, stamping each with the next sequence number,
    /// then hand each new record to every listener.
    ///
    /// Records are in the log before any listener runs. A panicking listener
    /// is logged and skipped; it cannot undo the append or stop the others.
    /// Returns how many deliveries panicked.
    pub fn commit(&mut self, events: Vec<LedgerEvent>, now: Timestamp) -> usize {
        let start = self.records.len();
        for event in events {
            let record = EventRecord {
                sequence: self.records.len() as u64 + 1,
                committed_at: now,
                event,
            };
            self.records.push(record);
        }

        let mut failed = 0;
        for record in &self.records[start..] {
            for listener in &self.listeners {
                let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener(record)));
                if delivered.is_err() {
                    failed += 1;
                    warn!(
                        sequence = record.sequence,
                        event = record.event.name(),
                        "event listener panicked"
                    );
                }
            }
        }
        failed
    }

    /// Records with a sequence number greater than `after`.
    pub fn since(&self, after: u64) -> Vec<EventRecord> {
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(self.records.len());
        self.records[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number of the newest record, 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.records.len() as u64
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn approval(id: u64) -> LedgerEvent {
        LedgerEvent::ApprovalGranted {
            operation_id: OperationId::new(id),
            auth_wallet: WalletAddress::new([7; 20]),
        }
    }

    #[test]
    fn sequences_are_gapless_from_one() {
        let mut log = EventLog::new();
        log.commit(vec![approval(1), approval(2)], Timestamp::new(10));
        log.commit(vec![approval(3)], Timestamp::new(11));
        let seqs: Vec<u64> = log.since(0).iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(log.last_sequence(), 3);
    }

    #[test]
    fn since_skips_seen_records() {
        let mut log = EventLog::new();
        log.commit(vec![approval(1), approval(2), approval(3)], Timestamp::new(10));
        let tail = log.since(2);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].event.operation_id(), OperationId::new(3));
        assert!(log.since(3).is_empty());
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn listeners_see_each_record_in_order() {
        let last_seen = Arc::new(AtomicU64::new(0));
        let mut log = EventLog::new();
        let seen = Arc::clone(&last_seen);
        log.subscribe(Box::new(move |record| {
            let prev = seen.swap(record.sequence, Ordering::SeqCst);
            assert_eq!(prev + 1, record.sequence);
        }));
        log.commit(vec![approval(1), approval(2)], Timestamp::new(1));
        assert_eq!(last_seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_commit_is_noop() {
        let mut log = EventLog::new();
        log.commit(Vec::new(), Timestamp::new(1));
        assert!(log.is_empty());
    }

    #[test]
    fn event_names() {
        assert_eq!(approval(1).name(), "ApprovalGranted");
    }

    #[test]
    fn panicking_listener_cannot_drop_records() {
        let delivered = Arc::new(AtomicU64::new(0));
        let mut log = EventLog::new();
        log.subscribe(Box::new(|record| {
            if record.sequence == 1 {
                panic!("listener failure");
            }
        }));
        let count = Arc::clone(&delivered);
        log.subscribe(Box::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        }));

        let failed = log.commit(vec![approval(1), approval(2)], Timestamp::new(1));
        assert_eq!(failed, 1);
        assert_eq!(log.last_sequence(), 2);
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }
}
