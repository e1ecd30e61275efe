use giveth_types::{DonationId, DonationStatus};
use thiserror::Error;

/// Errors produced by delegation operations.
#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("nothing to delegate")]
    NothingToDelegate,

    #[error("invalid amount {amount}: must be above zero and at most {remaining}")]
    InvalidAmount { amount: String, remaining: String },

    #[error("donation {0} has no intended project")]
    MissingIntendedProject(DonationId),

    #[error("donation {0} has no delegate")]
    MissingDelegate(DonationId),

    #[error("donation {0} has no remaining value")]
    DonationClosed(DonationId),

    #[error("a multi-delegation cannot target a DAC ({0})")]
    UnsupportedTarget(String),

    #[error("donation {donation} cannot move from {from} to {to}")]
    InvalidTransition {
        donation: DonationId,
        from: DonationStatus,
        to: DonationStatus,
    },

    #[error("no controller account known for {0}")]
    MissingAccount(String),

    #[error("chain error: {0}")]
    Chain(#[from] giveth_chain::ChainError),

    #[error("ledger error: {0}")]
    Ledger(#[from] giveth_ledger::LedgerError),

    #[error("pledge error: {0}")]
    Pledge(#[from] giveth_pledge::PledgeError),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

pub type DelegationResult<T> = Result<T, DelegationError>;
