//! Threshold parameters for deciding an operation.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};

/// Number of auth wallets designated per operation.
pub const AUTH_WALLET_COUNT: usize = 3;

/// Default number of approvals that authenticates an operation (2-of-3).
pub const MAX_APPROVAL_COUNT: u32 = 2;

/// How many votes of each kind make an operation terminal.
///
/// Whichever threshold is reached first decides the operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Approvals needed to authenticate.
    #[serde(default = "default_threshold")]
    pub approval_threshold: u32,

    /// Rejections needed to reject.
    #[serde(default = "default_threshold")]
    pub rejection_threshold: u32,
}

fn default_threshold() -> u32 {
    MAX_APPROVAL_COUNT
}

impl ThresholdParams {
    /// Majority of the auth-wallet set for both outcomes.
    pub fn majority() -> Self {
        Self {
            approval_threshold: MAX_APPROVAL_COUNT,
            rejection_threshold: MAX_APPROVAL_COUNT,
        }
    }

    pub fn new(approval_threshold: u32, rejection_threshold: u32) -> Result<Self, TypesError> {
        let params = Self {
            approval_threshold,
            rejection_threshold,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check both thresholds are reachable and that a fully voted operation
    /// is always decided.
    ///
    /// With `n` wallets, `a` approvals and `n - a` rejections, some `a` leaves
    /// both thresholds unmet exactly when `approval + rejection > n + 1`.
    pub fn validate(&self) -> Result<(), TypesError> {
        let n = AUTH_WALLET_COUNT as u32;
        let reachable = (1..=n).contains(&self.approval_threshold)
            && (1..=n).contains(&self.rejection_threshold);
        let always_decided = self
            .approval_threshold
            .checked_add(self.rejection_threshold)
            .is_some_and(|sum| sum <= n + 1);
        if reachable && always_decided {
            Ok(())
        } else {
            Err(TypesError::InvalidThresholds {
                approval: self.approval_threshold,
                rejection: self.rejection_threshold,
            })
        }
    }
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self::majority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_two_of_three() {
        let p = ThresholdParams::default();
        assert_eq!(p.approval_threshold, 2);
        assert_eq!(p.rejection_threshold, 2);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn asymmetric_thresholds_allowed() {
        assert!(ThresholdParams::new(3, 1).is_ok());
        assert!(ThresholdParams::new(1, 3).is_ok());
        assert!(ThresholdParams::new(1, 1).is_ok());
    }

    #[test]
    fn zero_threshold_rejected() {
        assert_eq!(
            ThresholdParams::new(0, 2),
            Err(TypesError::InvalidThresholds {
                approval: 0,
                rejection: 2
            })
        );
    }

    #[test]
    fn unreachable_threshold_rejected() {
        assert!(ThresholdParams::new(4, 1).is_err());
    }

    #[test]
    fn undecidable_combination_rejected() {
        // 2 approvals + 1 rejection would meet neither threshold.
        assert!(ThresholdParams::new(3, 2).is_err());
        assert!(ThresholdParams::new(3, 3).is_err());
    }

    #[test]
    fn huge_thresholds_rejected_without_overflow() {
        assert_eq!(
            ThresholdParams::new(u32::MAX, u32::MAX),
            Err(TypesError::InvalidThresholds {
                approval: u32::MAX,
                rejection: u32::MAX
            })
        );
        assert!(ThresholdParams::new(1, u32::MAX).is_err());
    }
}
