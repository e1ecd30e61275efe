use giveth_types::{Address, AdminId, Donation, DonationId, DonationStatus, PledgeId};
use serde::{Deserialize, Serialize};

/// Sort order for query results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Oldest first (`$sort: { createdAt: 1 }`).
    #[default]
    CreatedAtAsc,
    /// Newest first (`$sort: { createdAt: -1 }`).
    CreatedAtDesc,
}

/// Filter, sort, and paging for a donation query.
///
/// Every `Some` field must match; `None` fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationQuery {
    pub owner_id: Option<AdminId>,
    pub owner_type_id: Option<String>,
    pub delegate_id: Option<AdminId>,
    pub delegate_type_id: Option<String>,
    pub status: Option<DonationStatus>,
    pub token_address: Option<Address>,
    /// Match donations whose pledge is any of these.
    pub pledge_ids: Option<Vec<PledgeId>>,
    /// Match donations listing this record in `parentDonations`.
    pub parent: Option<DonationId>,
    /// Skip records flagged `lessThanCutoff`.
    pub exclude_less_than_cutoff: bool,
    pub sort: SortOrder,
    /// `$limit`; `None` returns every match after `skip`.
    pub limit: Option<usize>,
    /// `$skip`.
    pub skip: usize,
}

impl DonationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_id: AdminId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn owner_type_id(mut self, type_id: impl Into<String>) -> Self {
        self.owner_type_id = Some(type_id.into());
        self
    }

    pub fn delegate(mut self, delegate_id: AdminId) -> Self {
        self.delegate_id = Some(delegate_id);
        self
    }

    pub fn delegate_type_id(mut self, type_id: impl Into<String>) -> Self {
        self.delegate_type_id = Some(type_id.into());
        self
    }

    pub fn status(mut self, status: DonationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn token(mut self, token: Address) -> Self {
        self.token_address = Some(token);
        self
    }

    pub fn pledges(mut self, pledge_ids: Vec<PledgeId>) -> Self {
        self.pledge_ids = Some(pledge_ids);
        self
    }

    pub fn children_of(mut self, parent: DonationId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn exclude_less_than_cutoff(mut self) -> Self {
        self.exclude_less_than_cutoff = true;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Returns `true` if `donation` passes every filter of this query.
    pub fn matches(&self, donation: &Donation) -> bool {
        if let Some(owner_id) = self.owner_id {
            if donation.owner.admin_id != owner_id {
                return false;
            }
        }
        if let Some(ref type_id) = self.owner_type_id {
            if &donation.owner.type_id != type_id {
                return false;
            }
        }
        if let Some(delegate_id) = self.delegate_id {
            if donation.delegate.as_ref().map(|d| d.admin_id) != Some(delegate_id) {
                return false;
            }
        }
        if let Some(ref type_id) = self.delegate_type_id {
            if donation.delegate.as_ref().map(|d| &d.type_id) != Some(type_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if donation.status != status {
                return false;
            }
        }
        if let Some(ref token) = self.token_address {
            if donation.token_address.as_ref() != Some(token) {
                return false;
            }
        }
        if let Some(ref pledges) = self.pledge_ids {
            if !pledges.contains(&donation.pledge_id) {
                return false;
            }
        }
        if let Some(ref parent) = self.parent {
            if !donation.parent_donations.contains(parent) {
                return false;
            }
        }
        if self.exclude_less_than_cutoff && donation.less_than_cutoff {
            return false;
        }
        true
    }
}

/// One page of query results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Matches before paging.
    pub total: usize,
    pub limit: Option<usize>,
    pub skip: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// More matches exist beyond this page.
    pub fn has_more(&self) -> bool {
        self.skip + self.data.len() < self.total
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use giveth_types::{Amount, EntityKind, NewDonation, Party};

    use super::*;

    fn donation() -> Donation {
        let mut d = NewDonation::new(
            Amount::from(5u64),
            "0x3333333333333333333333333333333333333333".parse().unwrap(),
            Party::new(4, "camp-4", EntityKind::Campaign),
            DonationStatus::Committed,
        )
        .into_donation(DonationId::new("q1"), Utc::now());
        d.pledge_id = PledgeId(11);
        d.delegate = Some(Party::new(8, "dac-8", EntityKind::Dac));
        d
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(DonationQuery::new().matches(&donation()));
    }

    #[test]
    fn owner_and_status_filters() {
        let d = donation();
        assert!(DonationQuery::new().owner(4).status(DonationStatus::Committed).matches(&d));
        assert!(!DonationQuery::new().owner(5).matches(&d));
        assert!(!DonationQuery::new().status(DonationStatus::Waiting).matches(&d));
        assert!(DonationQuery::new().owner_type_id("camp-4").matches(&d));
    }

    #[test]
    fn delegate_filter_requires_a_delegate() {
        let mut d = donation();
        assert!(DonationQuery::new().delegate(8).delegate_type_id("dac-8").matches(&d));
        d.delegate = None;
        assert!(!DonationQuery::new().delegate(8).matches(&d));
    }

    #[test]
    fn pledge_overlap_and_cutoff() {
        let mut d = donation();
        assert!(DonationQuery::new().pledges(vec![PledgeId(3), PledgeId(11)]).matches(&d));
        assert!(!DonationQuery::new().pledges(vec![PledgeId(3)]).matches(&d));

        d.less_than_cutoff = true;
        assert!(DonationQuery::new().matches(&d));
        assert!(!DonationQuery::new().exclude_less_than_cutoff().matches(&d));
    }

    #[test]
    fn token_filter() {
        let mut d = donation();
        let token: Address = "0x5a42ca500ab159c51312b764bb25c135026e7a31".parse().unwrap();
        assert!(!DonationQuery::new().token(token.clone()).matches(&d));
        d.token_address = Some(token.clone());
        assert!(DonationQuery::new().token(token).matches(&d));
    }

    #[test]
    fn page_has_more() {
        let page = Page { data: vec![1, 2], total: 5, limit: Some(2), skip: 2 };
        assert!(page.has_more());
        let last = Page { data: vec![5], total: 5, limit: Some(2), skip: 4 };
        assert!(!last.has_more());
    }
}
