use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::entity::Party;
use crate::error::TypeError;
use crate::ids::{Address, AdminId, DonationId, PledgeId, TxHash};

/// Lifecycle state of a donation record.
///
/// Transitions only move forward. `ToApprove` is the one branching point:
/// a proposed delegation is either committed or rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationStatus {
    /// Value landed on-chain; not yet indexed into a pledge.
    Pending,
    /// Held by a delegate, waiting to be delegated further.
    Waiting,
    /// Proposed to a project; the giver may still reject it.
    ToApprove,
    /// Owned by a project.
    Committed,
    /// Being withdrawn.
    Paying,
    /// Fully disbursed.
    Paid,
    /// Proposed delegation was rejected.
    Rejected,
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }

    /// Whether a record in this status may move to `next`.
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        use DonationStatus::*;

        if *self == next {
            return true;
        }
        match self {
            Pending => matches!(next, Waiting | ToApprove | Committed | Paying | Rejected),
            Waiting => matches!(next, ToApprove | Committed | Paying | Rejected),
            ToApprove => matches!(next, Committed | Rejected | Paying),
            Committed => matches!(next, Paying),
            Paying => matches!(next, Paid),
            Paid | Rejected => false,
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Waiting => "Waiting",
            Self::ToApprove => "ToApprove",
            Self::Committed => "Committed",
            Self::Paying => "Paying",
            Self::Paid => "Paid",
            Self::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Off-chain ledger record tracking one fragment of donated value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    #[serde(default)]
    pub pledge_id: PledgeId,
    pub amount: Amount,
    pub amount_remaining: Amount,
    pub giver_address: Address,
    pub owner: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intended_project: Option<Party>,
    pub status: DonationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_tx_hash: Option<TxHash>,
    #[serde(default)]
    pub mined: bool,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub parent_donations: Vec<DonationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
    #[serde(default)]
    pub less_than_cutoff: bool,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// No value left on this record; any remainder lives in successors.
    pub fn is_closed(&self) -> bool {
        self.amount_remaining.is_zero()
    }

    /// A delegate with a real on-chain index is assigned.
    pub fn has_active_delegate(&self) -> bool {
        self.delegate.as_ref().is_some_and(|d| d.admin_id > 0)
    }

    /// The party whose controller signs transfers of this donation.
    pub fn acting_party(&self) -> &Party {
        match &self.delegate {
            Some(delegate) if delegate.admin_id > 0 => delegate,
            _ => &self.owner,
        }
    }

    /// Admin index used as the sender of a transfer.
    pub fn sender_id(&self) -> AdminId {
        self.acting_party().admin_id
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        if self.amount_remaining > self.amount {
            return Err(TypeError::RemainingExceedsAmount {
                amount: self.amount.to_string(),
                remaining: self.amount_remaining.to_string(),
            });
        }
        Ok(())
    }
}

/// Fields of a donation record before the ledger assigns id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    #[serde(default)]
    pub pledge_id: PledgeId,
    pub amount: Amount,
    pub amount_remaining: Amount,
    pub giver_address: Address,
    pub owner: Party,
    #[serde(default)]
    pub delegate: Option<Party>,
    #[serde(default)]
    pub intended_project: Option<Party>,
    pub status: DonationStatus,
    #[serde(default)]
    pub tx_hash: Option<TxHash>,
    #[serde(default)]
    pub home_tx_hash: Option<TxHash>,
    #[serde(default)]
    pub mined: bool,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub parent_donations: Vec<DonationId>,
    #[serde(default)]
    pub token_address: Option<Address>,
}

impl NewDonation {
    /// Unpledged record holding `amount` in full.
    pub fn new(amount: Amount, giver_address: Address, owner: Party, status: DonationStatus) -> Self {
        Self {
            pledge_id: PledgeId::UNPLEDGED,
            amount_remaining: amount.clone(),
            amount,
            giver_address,
            owner,
            delegate: None,
            intended_project: None,
            status,
            tx_hash: None,
            home_tx_hash: None,
            mined: false,
            is_return: false,
            parent_donations: Vec::new(),
            token_address: None,
        }
    }

    pub fn into_donation(self, id: DonationId, created_at: DateTime<Utc>) -> Donation {
        Donation {
            id,
            pledge_id: self.pledge_id,
            amount: self.amount,
            amount_remaining: self.amount_remaining,
            giver_address: self.giver_address,
            owner: self.owner,
            delegate: self.delegate,
            intended_project: self.intended_project,
            status: self.status,
            tx_hash: self.tx_hash,
            home_tx_hash: self.home_tx_hash,
            mined: self.mined,
            is_return: self.is_return,
            parent_donations: self.parent_donations,
            token_address: self.token_address,
            less_than_cutoff: false,
            created_at,
        }
    }
}
