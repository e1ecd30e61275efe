use std::fmt;

use giveth_chain::SubmittedCall;
use giveth_types::{Amount, DonationId};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DelegationAction {
    DelegateMultiple,
    Delegate,
    Reject,
    Commit,
    Refund,
}

impl fmt::Display for DelegationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DelegateMultiple => "delegate-multiple",
            Self::Delegate => "delegate",
            Self::Reject => "reject",
            Self::Commit => "commit",
            Self::Refund => "refund",
        };
        f.write_str(s)
    }
}

/// A fully prepared action, shown to the observer before submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationPlan {
    pub action: DelegationAction,
    pub call: SubmittedCall,
    /// Value the transaction moves.
    pub amount: Amount,
    /// Requested value the source donations could not cover.
    pub shortfall: Amount,
    /// Ledger records touched at the hash checkpoint.
    pub donations: Vec<DonationId>,
    pub comment: Option<String>,
}

impl fmt::Display for DelegationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} donation(s) via {}",
            self.action,
            self.amount,
            self.donations.len(),
            self.call
        )
    }
}
