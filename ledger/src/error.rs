use authwallet_types::{OperationId, TypesError, WalletAddress};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid auth wallet set: {reason}")]
    InvalidAuthSet { reason: String },

    #[error("wallet {0} already has a pending or authenticated operation")]
    AlreadyRegistered(WalletAddress),

    #[error("operation {0} does not exist")]
    UnknownOperation(OperationId),

    #[error("wallet {wallet} is not an auth wallet of operation {operation_id}")]
    NotAnAuthWallet {
        operation_id: OperationId,
        wallet: WalletAddress,
    },

    #[error("operation {0} is already decided")]
    OperationNotActive(OperationId),

    #[error("wallet {wallet} has already voted on operation {operation_id}")]
    AlreadyVoted {
        operation_id: OperationId,
        wallet: WalletAddress,
    },

    #[error("only the main wallet of operation {operation_id} can reset it, not {caller}")]
    OnlyMainWalletCanReset {
        operation_id: OperationId,
        caller: WalletAddress,
    },

    #[error("operation {0} is still pending and cannot be reset")]
    OperationNotTerminal(OperationId),

    #[error("operation {operation_id} was superseded by operation {current}")]
    OperationSuperseded {
        operation_id: OperationId,
        current: OperationId,
    },

    #[error("wallet {0} has no registered operation")]
    NotRegistered(WalletAddress),

    #[error("operation id space is exhausted")]
    OperationIdsExhausted,

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl LedgerError {
    /// Short, stable name of the error kind (used as a metrics label).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAuthSet { .. } => "invalid_auth_set",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::NotAnAuthWallet { .. } => "not_an_auth_wallet",
            Self::OperationNotActive(_) => "operation_not_active",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::OnlyMainWalletCanReset { .. } => "only_main_wallet_can_reset",
            Self::OperationNotTerminal(_) => "operation_not_terminal",
            Self::OperationSuperseded { .. } => "operation_superseded",
            Self::NotRegistered(_) => "not_registered",
            Self::OperationIdsExhausted => "operation_ids_exhausted",
            Self::Config(_) => "config",
            Self::Snapshot(_) => "snapshot",
            Self::Types(_) => "types",
        }
    }

    /// Whether this is a rejected call (a precondition failure) rather than
    /// a setup failure of the ledger itself.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            Self::OperationIdsExhausted | Self::Config(_) | Self::Snapshot(_) | Self::Types(_)
        )
    }
}
