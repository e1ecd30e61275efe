use giveth_types::{Amount, Donation, DonationId, DonationStatus, NewDonation, Party, PledgeId, TxHash};

use crate::error::{LedgerError, LedgerResult};
use crate::patch::DonationPatch;
use crate::traits::DonationStore;

/// Record created as the byproduct of a delegation action.
///
/// Starts from its parent's giver, owner, and token; everything else is
/// set through the builder methods. The transaction hash is attached once
/// it is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Successor {
    donation: NewDonation,
}

impl Successor {
    pub fn of(parent: &Donation, amount: Amount, status: DonationStatus) -> Self {
        let mut donation = NewDonation::new(
            amount,
            parent.giver_address.clone(),
            parent.owner.bare(),
            status,
        );
        donation.token_address = parent.token_address.clone();
        donation.parent_donations = vec![parent.id.clone()];
        Self { donation }
    }

    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.donation.tx_hash = Some(tx_hash);
        self
    }

    pub fn owned_by(mut self, owner: Party) -> Self {
        self.donation.owner = owner.bare();
        self
    }

    pub fn delegated_to(mut self, delegate: Party) -> Self {
        self.donation.delegate = Some(delegate.bare());
        self
    }

    pub fn intended_for(mut self, project: Party) -> Self {
        self.donation.intended_project = Some(project.bare());
        self
    }

    pub fn as_return(mut self) -> Self {
        self.donation.is_return = true;
        self
    }

    pub fn parents(&self) -> &[DonationId] {
        &self.donation.parent_donations
    }

    pub fn amount(&self) -> &Amount {
        &self.donation.amount
    }

    pub fn status(&self) -> DonationStatus {
        self.donation.status
    }

    pub fn into_new_donation(self) -> LedgerResult<NewDonation> {
        self.validate()?;
        Ok(self.donation)
    }

    fn validate(&self) -> LedgerResult<()> {
        let d = &self.donation;
        if d.parent_donations.is_empty() {
            return Err(LedgerError::InvalidSuccessor("no parent donations".into()));
        }
        if d.pledge_id != PledgeId::UNPLEDGED {
            return Err(LedgerError::InvalidSuccessor(format!(
                "pledge id must be unassigned, found {}",
                d.pledge_id
            )));
        }
        if d.amount.is_zero() {
            return Err(LedgerError::InvalidSuccessor("zero amount".into()));
        }
        if d.amount_remaining != d.amount {
            return Err(LedgerError::InvalidSuccessor(format!(
                "amountRemaining {} differs from amount {}",
                d.amount_remaining, d.amount
            )));
        }
        if d.mined {
            return Err(LedgerError::InvalidSuccessor("already mined".into()));
        }
        Ok(())
    }
}

/// Optimistic ledger updates applied when a transaction hash is observed.
///
/// The external indexer corrects the projection once the transaction is
/// mined; nothing here is rolled back or retried.
pub struct LedgerReconciler<S> {
    store: S,
}

impl<S: DonationStore> LedgerReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reduce `amountRemaining` by `amount` (saturating at zero) and
    /// optionally move the record to `status`.
    ///
    /// A zero amount without a status leaves the record untouched.
    pub async fn decrement_remaining(
        &self,
        id: &DonationId,
        amount: &Amount,
        status: Option<DonationStatus>,
    ) -> LedgerResult<Donation> {
        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;

        if amount.is_zero() && status.is_none() {
            return Ok(current);
        }

        let mut patch = DonationPatch::new();
        if !amount.is_zero() {
            patch = patch.with_amount_remaining(current.amount_remaining.saturating_sub(amount));
        }
        if let Some(status) = status {
            patch = patch.with_status(status);
        }

        let updated = self.store.patch(id, &patch).await?;
        tracing::info!(
            donation = %id,
            decrement = %amount,
            remaining = %updated.amount_remaining,
            status = %updated.status,
            "decremented donation"
        );
        Ok(updated)
    }

    pub async fn create_successor(&self, successor: Successor) -> LedgerResult<Donation> {
        let new = successor.into_new_donation()?;
        let created = self.store.create(new).await?;
        tracing::info!(
            donation = %created.id,
            parents = ?created.parent_donations,
            amount = %created.amount,
            status = %created.status,
            "created successor donation"
        );
        Ok(created)
    }

    /// Apply `patch` to one record; an empty patch is not written.
    pub async fn apply_patch(&self, id: &DonationId, patch: &DonationPatch) -> LedgerResult<Donation> {
        if patch.is_empty() {
            return self
                .store
                .get(id)
                .await?
                .ok_or_else(|| LedgerError::DonationNotFound(id.clone()));
        }
        let updated = self.store.patch(id, patch).await?;
        tracing::debug!(donation = %id, "applied donation patch");
        Ok(updated)
    }
}
