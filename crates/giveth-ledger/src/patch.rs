use giveth_types::{Amount, Donation, DonationStatus, Party, TxHash};
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};

/// Partial update of a donation record.
///
/// Only the fields the delegation flows are allowed to touch are present.
/// Applying a patch enforces the record invariants: `amountRemaining`
/// never grows and never exceeds `amount`, and status moves forward only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_remaining: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DonationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intended_project: Option<Party>,
}

impl DonationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount_remaining(mut self, amount: Amount) -> Self {
        self.amount_remaining = Some(amount);
        self
    }

    pub fn with_status(mut self, status: DonationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }

    pub fn with_mined(mut self, mined: bool) -> Self {
        self.mined = Some(mined);
        self
    }

    pub fn with_owner(mut self, owner: Party) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_intended_project(mut self, project: Party) -> Self {
        self.intended_project = Some(project);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to `donation`, refusing changes that break record invariants.
    pub fn apply_to(&self, donation: &mut Donation) -> LedgerResult<()> {
        if let Some(remaining) = &self.amount_remaining {
            if remaining > &donation.amount_remaining {
                return Err(LedgerError::IntegrityViolation {
                    id: donation.id.clone(),
                    reason: format!(
                        "amountRemaining may not grow ({} -> {remaining})",
                        donation.amount_remaining
                    ),
                });
            }
        }
        if let Some(status) = self.status {
            if !donation.status.can_transition_to(status) {
                return Err(LedgerError::InvalidTransition {
                    id: donation.id.clone(),
                    from: donation.status,
                    to: status,
                });
            }
        }

        if let Some(remaining) = &self.amount_remaining {
            donation.amount_remaining = remaining.clone();
        }
        if let Some(status) = self.status {
            donation.status = status;
        }
        if let Some(tx_hash) = &self.tx_hash {
            donation.tx_hash = Some(tx_hash.clone());
        }
        if let Some(mined) = self.mined {
            donation.mined = mined;
        }
        if let Some(owner) = &self.owner {
            donation.owner = owner.clone();
        }
        if let Some(project) = &self.intended_project {
            donation.intended_project = Some(project.clone());
        }
        Ok(())
    }
}
