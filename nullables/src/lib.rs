//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the ledger are abstracted behind traits. This
//! crate provides test-friendly implementations that return deterministic
//! values and can be controlled programmatically.

pub mod clock;

pub use clock::NullClock;
