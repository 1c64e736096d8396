//! Error type for the shared value types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid thresholds: approval {approval}, rejection {rejection}")]
    InvalidThresholds { approval: u32, rejection: u32 },
}
