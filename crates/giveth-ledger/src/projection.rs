use std::collections::{BTreeMap, HashSet, VecDeque};

use giveth_types::{AdminId, Amount, Donation, DonationId, DonationStatus, TxHash};
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::query::DonationQuery;
use crate::traits::DonationStore;

/// One ancestor of a donation in the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEntry {
    /// Distance from the starting record (0 is the record itself).
    pub depth: usize,
    pub donation_id: DonationId,
    pub amount: Amount,
    pub amount_remaining: Amount,
    pub status: DonationStatus,
    pub owner_id: AdminId,
    pub tx_hash: Option<TxHash>,
}

/// Ancestry of a donation reconstructed from `parentDonations`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageProjection {
    pub donation_id: DonationId,
    /// Breadth-first, each record once.
    pub entries: Vec<LineageEntry>,
    /// Records without parents.
    pub roots: Vec<DonationId>,
    /// Parents referenced but absent from the ledger.
    pub missing: Vec<DonationId>,
}

/// Open balances of one owner, per status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub owner_id: AdminId,
    pub by_status: BTreeMap<String, Amount>,
    pub total_remaining: Amount,
    pub open_records: usize,
}

/// Read-only projections over the donation ledger.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    pub async fn lineage<S: DonationStore + ?Sized>(
        store: &S,
        id: &DonationId,
    ) -> LedgerResult<LineageProjection> {
        let start = store
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;

        let mut entries = Vec::new();
        let mut roots = Vec::new();
        let mut missing = Vec::new();
        let mut seen: HashSet<DonationId> = HashSet::from([start.id.clone()]);
        let mut queue: VecDeque<(usize, Donation)> = VecDeque::from([(0, start)]);

        while let Some((depth, donation)) = queue.pop_front() {
            if donation.parent_donations.is_empty() {
                roots.push(donation.id.clone());
            }
            for parent_id in &donation.parent_donations {
                if !seen.insert(parent_id.clone()) {
                    continue;
                }
                match store.get(parent_id).await? {
                    Some(parent) => queue.push_back((depth + 1, parent)),
                    None => missing.push(parent_id.clone()),
                }
            }
            entries.push(LineageEntry {
                depth,
                donation_id: donation.id,
                amount: donation.amount,
                amount_remaining: donation.amount_remaining,
                status: donation.status,
                owner_id: donation.owner.admin_id,
                tx_hash: donation.tx_hash,
            });
        }

        Ok(LineageProjection {
            donation_id: id.clone(),
            entries,
            roots,
            missing,
        })
    }

    pub async fn owner_summary<S: DonationStore + ?Sized>(
        store: &S,
        owner_id: AdminId,
    ) -> LedgerResult<OwnerSummary> {
        let page = store.find(&DonationQuery::new().owner(owner_id)).await?;

        let mut by_status: BTreeMap<String, Amount> = BTreeMap::new();
        let mut total_remaining = Amount::zero();
        let mut open_records = 0;
        for donation in page.data.iter().filter(|d| !d.is_closed()) {
            *by_status.entry(donation.status.to_string()).or_default() += &donation.amount_remaining;
            total_remaining += &donation.amount_remaining;
            open_records += 1;
        }

        Ok(OwnerSummary {
            owner_id,
            by_status,
            total_remaining,
            open_records,
        })
    }
}
