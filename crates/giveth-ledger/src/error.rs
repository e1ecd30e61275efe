use giveth_types::{DonationId, DonationStatus};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("donation not found: {0}")]
    DonationNotFound(DonationId),

    #[error("donation {id}: status cannot move from {from} to {to}")]
    InvalidTransition {
        id: DonationId,
        from: DonationStatus,
        to: DonationStatus,
    },

    #[error("integrity violation on donation {id}: {reason}")]
    IntegrityViolation { id: DonationId, reason: String },

    #[error("invalid successor donation: {0}")]
    InvalidSuccessor(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
