use std::collections::HashMap;

use giveth_types::{Amount, Donation, DonationId, PledgeId};
use serde::Serialize;

use crate::error::PledgeResult;
use crate::note::PledgeNote;

/// A fragment of on-chain value that can be moved by a transfer.
pub trait PledgeFragment {
    fn donation_id(&self) -> &DonationId;
    fn pledge_id(&self) -> PledgeId;
    /// Value still available on this fragment.
    fn available(&self) -> &Amount;
}

impl PledgeFragment for Donation {
    fn donation_id(&self) -> &DonationId {
        &self.id
    }

    fn pledge_id(&self) -> PledgeId {
        self.pledge_id
    }

    fn available(&self) -> &Amount {
        &self.amount_remaining
    }
}

/// Amount to move out of one pledge, summed over its fragments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeAmount {
    pub pledge_id: PledgeId,
    pub amount: Amount,
}

/// How much of one input fragment went into the allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedFragment {
    /// Position in the input sequence.
    pub index: usize,
    pub donation_id: DonationId,
    pub pledge_id: PledgeId,
    pub contribution: Amount,
    /// The whole available value was used.
    pub fully_donated: bool,
}

/// Result of carving a target amount out of a list of fragments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub target: Amount,
    /// Sum of all contributions; equals `target` unless the fragments ran out.
    pub total: Amount,
    /// Consolidated per-pledge amounts in first-seen order.
    pub pledges: Vec<PledgeAmount>,
    /// Consumed fragments in traversal order.
    pub consumed: Vec<ConsumedFragment>,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    /// Part of the target the fragments could not cover.
    pub fn shortfall(&self) -> Amount {
        self.target.saturating_sub(&self.total)
    }

    /// The partially donated fragment, if the allocation split one.
    pub fn split_point(&self) -> Option<&ConsumedFragment> {
        self.consumed.iter().find(|c| !c.fully_donated)
    }

    pub fn fully_donated(&self, donation_id: &DonationId) -> Option<bool> {
        self.consumed
            .iter()
            .find(|c| &c.donation_id == donation_id)
            .map(|c| c.fully_donated)
    }

    pub fn notes(&self) -> Vec<PledgeNote> {
        self.pledges
            .iter()
            .map(|p| PledgeNote::new(p.amount.clone(), p.pledge_id))
            .collect()
    }

    /// Notes packed into the hex words expected by the contract.
    pub fn encoded_notes(&self) -> PledgeResult<Vec<String>> {
        self.notes().iter().map(PledgeNote::encode).collect()
    }
}

/// Carve `target` out of `fragments`, oldest first.
///
/// Each fragment contributes `min(available, target - running_total)`.
/// The scan stops as soon as the target is reached, so at most one
/// fragment (the last consumed one) is partially donated and later
/// fragments are left untouched. Fragments with nothing available are
/// skipped. If the fragments hold less than `target`, the allocation is
/// capped at what they hold; see [`Allocation::shortfall`].
pub fn allocate<'a, F>(fragments: impl IntoIterator<Item = &'a F>, target: &Amount) -> Allocation
where
    F: PledgeFragment + 'a,
{
    let mut total = Amount::zero();
    let mut pledges: Vec<PledgeAmount> = Vec::new();
    let mut pledge_index: HashMap<PledgeId, usize> = HashMap::new();
    let mut consumed = Vec::new();

    for (index, fragment) in fragments.into_iter().enumerate() {
        let outstanding = target.saturating_sub(&total);
        if outstanding.is_zero() {
            break;
        }

        let available = fragment.available();
        if available.is_zero() {
            continue;
        }

        let fully_donated = *available <= outstanding;
        let contribution = if fully_donated {
            available.clone()
        } else {
            outstanding
        };

        match pledge_index.get(&fragment.pledge_id()) {
            Some(&slot) => pledges[slot].amount += &contribution,
            None => {
                pledge_index.insert(fragment.pledge_id(), pledges.len());
                pledges.push(PledgeAmount {
                    pledge_id: fragment.pledge_id(),
                    amount: contribution.clone(),
                });
            }
        }

        total += &contribution;
        consumed.push(ConsumedFragment {
            index,
            donation_id: fragment.donation_id().clone(),
            pledge_id: fragment.pledge_id(),
            contribution,
            fully_donated,
        });
    }

    tracing::debug!(
        target_amount = %target,
        total = %total,
        pledges = pledges.len(),
        consumed = consumed.len(),
        "allocated pledges"
    );

    Allocation {
        target: target.clone(),
        total,
        pledges,
        consumed,
    }
}
