use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown entity type: {0}")]
    UnknownEntityKind(String),

    #[error("{0} cannot receive a delegation")]
    NotADelegateTarget(String),

    #[error("amount remaining {remaining} exceeds amount {amount}")]
    RemainingExceedsAmount { amount: String, remaining: String },
}
