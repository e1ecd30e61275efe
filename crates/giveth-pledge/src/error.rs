/// Errors produced by pledge encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PledgeError {
    #[error("amount {amount} does not fit in {bits} bits")]
    AmountOverflow { amount: String, bits: u32 },

    #[error("malformed pledge note {note:?}: {reason}")]
    MalformedNote { note: String, reason: String },
}

pub type PledgeResult<T> = Result<T, PledgeError>;
