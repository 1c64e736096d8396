//! Operation identifiers, votes, and the operation lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one authentication request.
///
/// Ids start at 1 and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(u64);

impl OperationId {
    /// The id handed out to the very first registration.
    pub const FIRST: Self = Self(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id allocated after this one, `None` once the id space is used up.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for OperationId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A vote cast by an auth wallet. Votes are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Approve,
    Reject,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Where an operation is in its lifecycle.
///
/// `Authenticated` and `Rejected` are terminal; only a reset by the main
/// wallet moves a record back to `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
    #[default]
    Pending,
    Authenticated,
    Rejected,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticated => "authenticated",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_by_one() {
        assert_eq!(OperationId::FIRST.as_u64(), 1);
        assert_eq!(OperationId::FIRST.next(), Some(OperationId::new(2)));
        assert!(OperationId::new(2) > OperationId::FIRST);
    }

    #[test]
    fn last_id_has_no_successor() {
        assert_eq!(OperationId::new(u64::MAX).next(), None);
        assert_eq!(
            OperationId::new(u64::MAX - 1).next(),
            Some(OperationId::new(u64::MAX))
        );
    }

    #[test]
    fn only_decided_states_are_terminal() {
        assert!(!OperationStatus::Pending.is_terminal());
        assert!(OperationStatus::Authenticated.is_terminal());
        assert!(OperationStatus::Rejected.is_terminal());
        assert_eq!(OperationStatus::default(), OperationStatus::Pending);
    }
}
