use giveth_types::TxHash;
use thiserror::Error;

/// Errors reported by a chain gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The node or wallet refused the call before broadcasting it.
    #[error("transaction submission rejected: {0}")]
    SubmissionRejected(String),

    /// Error raised by the node while tracking a transaction; the message
    /// is kept verbatim.
    #[error("{0}")]
    Transaction(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("transaction handle closed before {0}")]
    HandleClosed(&'static str),

    #[error("gateway error: {0}")]
    Gateway(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
