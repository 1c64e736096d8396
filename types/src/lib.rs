//! Fundamental types for wallet threshold authentication.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! wallet addresses, operation ids, votes and operation status, threshold
//! parameters, and timestamps.

pub mod address;
pub mod error;
pub mod operation;
pub mod params;
pub mod time;

pub use address::WalletAddress;
pub use error::TypesError;
pub use operation::{OperationId, OperationStatus, Vote};
pub use params::{ThresholdParams, AUTH_WALLET_COUNT, MAX_APPROVAL_COUNT};
pub use time::{Clock, SystemClock, Timestamp};
