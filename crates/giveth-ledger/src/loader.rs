use std::collections::HashSet;

use giveth_types::{Address, AdminId, Amount, DelegateTarget, Donation, DonationStatus, PledgeId, ProjectId};
use serde::Serialize;

use crate::error::LedgerResult;
use crate::query::{DonationQuery, SortOrder};
use crate::traits::DonationStore;

/// Entity whose donations are being delegated onward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegationSource {
    /// Donations waiting on a DAC.
    Dac { delegate_id: AdminId, type_id: String },
    /// Donations committed to a campaign.
    Campaign { project_id: ProjectId, type_id: String },
}

impl DelegationSource {
    fn base_query(&self) -> DonationQuery {
        match self {
            Self::Dac { delegate_id, type_id } => DonationQuery::new()
                .delegate(*delegate_id)
                .delegate_type_id(type_id.clone())
                .status(DonationStatus::Waiting),
            Self::Campaign { project_id, type_id } => DonationQuery::new()
                .owner(*project_id)
                .owner_type_id(type_id.clone())
                .status(DonationStatus::Committed),
        }
    }
}

/// Donations available for a multi-delegation, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegableDonations {
    pub donations: Vec<Donation>,
    /// Every matching donation in the ledger, loaded or not.
    pub total: usize,
    pub distinct_pledges: usize,
}

impl DelegableDonations {
    /// Some matching donations were left out by the pledge limit.
    pub fn is_limited(&self) -> bool {
        self.total > self.donations.len()
    }

    pub fn available(&self) -> Amount {
        self.donations.iter().map(|d| &d.amount_remaining).sum()
    }
}

/// Load the oldest delegable donations of `source` in `token`.
///
/// Donations are taken from at most `limit` distinct pledges. Once the
/// limit is reached, following donations are still taken one at a time
/// for as long as they belong to a pledge already in the set.
pub async fn load_delegable<S: DonationStore + ?Sized>(
    store: &S,
    source: &DelegationSource,
    token: &Address,
    limit: usize,
) -> LedgerResult<DelegableDonations> {
    let base = source
        .base_query()
        .token(token.clone())
        .exclude_less_than_cutoff()
        .sort(SortOrder::CreatedAtAsc);

    let mut donations: Vec<Donation> = Vec::new();
    let mut pledges: HashSet<PledgeId> = HashSet::new();
    let mut spare = limit;
    let mut total;

    loop {
        let page = store
            .find(&base.clone().limit(spare.max(1)).skip(donations.len()))
            .await?;
        total = page.total;

        let Some(first) = page.data.first() else {
            break;
        };
        if spare == 0 {
            if !pledges.contains(&first.pledge_id) {
                break;
            }
        } else {
            pledges.extend(page.data.iter().map(|d| d.pledge_id));
            spare = limit.saturating_sub(pledges.len());
        }

        donations.extend(page.data);
        if donations.len() >= total {
            break;
        }
    }

    tracing::debug!(
        source = ?source,
        loaded = donations.len(),
        total,
        pledges = pledges.len(),
        "loaded delegable donations"
    );

    Ok(DelegableDonations {
        donations,
        total,
        distinct_pledges: pledges.len(),
    })
}

/// How much of a donation set can be delegated to a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationBudget {
    /// Sum of `amountRemaining` over the donations.
    pub available: Amount,
    /// `available`, or the target's remaining capacity if lower.
    pub max_delegable: Amount,
    pub capped_by_target: bool,
}

pub fn delegation_budget(donations: &[Donation], target: Option<&DelegateTarget>) -> DelegationBudget {
    let available: Amount = donations.iter().map(|d| &d.amount_remaining).sum();

    match target.and_then(DelegateTarget::remaining_capacity) {
        Some(capacity) if capacity < available => DelegationBudget {
            available,
            max_delegable: capacity,
            capped_by_target: true,
        },
        _ => DelegationBudget {
            max_delegable: available.clone(),
            available,
            capped_by_target: false,
        },
    }
}
