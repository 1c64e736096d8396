//! Property tests: arbitrary call sequences never break the ledger's
//! bookkeeping, whatever mix of valid and refused calls they contain.

use authwallet_ledger::{AuthLedger, LedgerConfig, LedgerError};
use authwallet_nullables::NullClock;
use authwallet_types::{OperationId, OperationStatus, Vote, WalletAddress};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

// A small wallet universe so sequences collide often: users and auth
// wallets overlap, and the same wallets keep getting reused.
const WALLETS: u8 = 6;

fn addr(n: u8) -> WalletAddress {
    WalletAddress::new([n + 1; 20])
}

#[derive(Clone, Debug)]
enum Call {
    Register { caller: u8, auths: [u8; 3] },
    Vote { caller: u8, id: u64, approve: bool },
    Reset { caller: u8, id: u64 },
    ResetForUser { caller: u8 },
}

fn arb_call() -> impl Strategy<Value = Call> {
    let wallet = 0..WALLETS;
    prop_oneof![
        (wallet.clone(), prop::array::uniform3(0..WALLETS))
            .prop_map(|(caller, auths)| Call::Register { caller, auths }),
        (wallet.clone(), 1u64..8, any::<bool>())
            .prop_map(|(caller, id, approve)| Call::Vote { caller, id, approve }),
        (wallet.clone(), 1u64..8).prop_map(|(caller, id)| Call::Reset { caller, id }),
        wallet.prop_map(|caller| Call::ResetForUser { caller }),
    ]
}

fn apply(ledger: &AuthLedger, call: &Call) -> Result<(), LedgerError> {
    match *call {
        Call::Register { caller, auths } => ledger
            .register(addr(caller), auths.map(addr))
            .map(|_| ()),
        Call::Vote {
            caller,
            id,
            approve,
        } => {
            let vote = if approve { Vote::Approve } else { Vote::Reject };
            ledger
                .vote(addr(caller), OperationId::new(id), vote)
                .map(|_| ())
        }
        Call::Reset { caller, id } => ledger.reset(addr(caller), OperationId::new(id)),
        Call::ResetForUser { caller } => ledger.reset_for_user(addr(caller)).map(|_| ()),
    }
}

fn all_records(ledger: &AuthLedger) -> Vec<authwallet_ledger::OperationRecord> {
    let last = ledger.last_operation_id().map_or(0, |id| id.as_u64());
    (1..=last)
        .map(|n| ledger.get_operation(OperationId::new(n)).unwrap())
        .collect()
}

fn check_invariants(ledger: &AuthLedger) {
    let thresholds = ledger.thresholds();
    let records = all_records(ledger);
    assert_eq!(records.len(), ledger.operation_count());

    let mut live_per_user: HashMap<WalletAddress, usize> = HashMap::new();
    for record in &records {
        let approvals = record.approval_count();
        let rejections = record.rejection_count();
        let voted = record.votes.iter().filter(|v| v.is_some()).count() as u32;
        assert_eq!(approvals + rejections, voted);

        match record.status {
            OperationStatus::Authenticated => {
                assert!(approvals >= thresholds.approval_threshold)
            }
            OperationStatus::Rejected => {
                assert!(rejections >= thresholds.rejection_threshold)
            }
            OperationStatus::Pending => {
                assert!(approvals < thresholds.approval_threshold);
                assert!(rejections < thresholds.rejection_threshold);
                *live_per_user.entry(record.main_wallet).or_default() += 1;
            }
        }
        assert_eq!(record.is_terminal(), record.decided_at.is_some());

        for (slot, wallet) in record.auth_wallets.iter().enumerate() {
            assert!(ledger
                .get_auth_wallet_operations(wallet)
                .contains(&record.operation_id));
            let expected = !record.is_terminal() && record.votes[slot].is_none();
            let pending = ledger.get_pending_for_auth_wallet(wallet);
            assert_eq!(
                pending.contains(&record.operation_id),
                expected,
                "pending membership of {} for {}",
                record.operation_id,
                wallet
            );
        }
    }

    // Nobody outside a record's auth set ever sees it as pending.
    for n in 0..WALLETS {
        let wallet = addr(n);
        let pending = ledger.get_pending_for_auth_wallet(&wallet);
        let mut sorted = pending.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(pending, sorted);
        for id in pending {
            let record = &records[(id.as_u64() - 1) as usize];
            assert!(record.is_auth_wallet(&wallet));
        }
        for id in ledger.get_auth_wallet_operations(&wallet) {
            let record = &records[(id.as_u64() - 1) as usize];
            assert!(record.is_auth_wallet(&wallet));
        }
    }

    for (user, live) in live_per_user {
        assert!(live <= 1, "{user} has {live} pending operations");
    }

    let pending_all: Vec<OperationId> = records
        .iter()
        .filter(|r| !r.is_terminal())
        .map(|r| r.operation_id)
        .collect();
    assert_eq!(ledger.get_all_pending_operations(), pending_all);
}

proptest! {
    #[test]
    fn random_calls_preserve_invariants(calls in prop::collection::vec(arb_call(), 1..60)) {
        let ledger = AuthLedger::with_clock(
            LedgerConfig::default(),
            Arc::new(NullClock::default()),
        )
        .unwrap();

        for call in &calls {
            let before_events = ledger.last_event_sequence();
            let before = all_records(&ledger);
            match apply(&ledger, call) {
                Ok(()) => prop_assert!(ledger.last_event_sequence() > before_events),
                Err(_) => {
                    // A refused call changes nothing.
                    prop_assert_eq!(ledger.last_event_sequence(), before_events);
                    prop_assert_eq!(all_records(&ledger), before);
                }
            }
            check_invariants(&ledger);
        }
    }

    #[test]
    fn snapshot_restore_preserves_every_query(calls in prop::collection::vec(arb_call(), 1..40)) {
        let clock = Arc::new(NullClock::default());
        let ledger = AuthLedger::with_clock(LedgerConfig::default(), clock.clone()).unwrap();
        for call in &calls {
            let _ = apply(&ledger, call);
        }

        let restored =
            AuthLedger::restore(ledger.snapshot(), LedgerConfig::default(), clock).unwrap();
        prop_assert_eq!(all_records(&restored), all_records(&ledger));
        for n in 0..WALLETS {
            let wallet = addr(n);
            prop_assert_eq!(
                restored.get_pending_for_auth_wallet(&wallet),
                ledger.get_pending_for_auth_wallet(&wallet)
            );
            prop_assert_eq!(
                restored.get_auth_wallet_operations(&wallet),
                ledger.get_auth_wallet_operations(&wallet)
            );
            prop_assert_eq!(
                restored.get_user_operation(&wallet),
                ledger.get_user_operation(&wallet)
            );
        }
        check_invariants(&restored);
    }
}
