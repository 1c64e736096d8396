//! Threshold approval ledger for wallet authentication.
//!
//! A main wallet registers an operation naming three auth wallets. Each auth
//! wallet may approve or reject once; the operation authenticates or is
//! rejected as soon as the configured threshold is reached, and only the
//! main wallet can reset a decided operation for another round.
//!
//! Components:
//! - [`RegistrationManager`] opens operations and enforces one live
//!   operation per user.
//! - [`VotingEngine`] records votes and applies thresholds.
//! - [`IndexMaintainer`] keeps the user and pending-vote indices in step.
//! - [`ResetManager`] reopens decided operations.
//! - [`AuthLedger`] ties them together behind one lock, with events,
//!   metrics, and snapshots.

pub mod config;
pub mod error;
pub mod events;
pub mod index;
pub mod ledger;
pub mod metrics;
pub mod record;
pub mod registration;
pub mod reset;
pub mod snapshot;
pub mod state;
pub mod voting;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use index::IndexMaintainer;
pub use ledger::AuthLedger;
pub use metrics::LedgerMetrics;
pub use record::OperationRecord;
pub use registration::RegistrationManager;
pub use reset::ResetManager;
pub use snapshot::{LedgerSnapshot, SNAPSHOT_VERSION};
pub use state::LedgerState;
pub use voting::{VoteOutcome, VotingEngine};
