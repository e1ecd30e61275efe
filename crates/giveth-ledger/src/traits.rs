use std::sync::Arc;

use async_trait::async_trait;
use giveth_types::{Donation, DonationId, NewDonation};

use crate::error::LedgerResult;
use crate::patch::DonationPatch;
use crate::query::{DonationQuery, Page};

/// Boundary to the donation ledger service.
///
/// The ledger owns persisted donation state. Callers only hold
/// request-scoped copies of the records they read.
#[async_trait]
pub trait DonationStore: Send + Sync {
    async fn find(&self, query: &DonationQuery) -> LedgerResult<Page<Donation>>;

    async fn get(&self, id: &DonationId) -> LedgerResult<Option<Donation>>;

    async fn patch(&self, id: &DonationId, patch: &DonationPatch) -> LedgerResult<Donation>;

    async fn create(&self, donation: NewDonation) -> LedgerResult<Donation>;
}

#[async_trait]
impl<S: DonationStore + ?Sized> DonationStore for Arc<S> {
    async fn find(&self, query: &DonationQuery) -> LedgerResult<Page<Donation>> {
        (**self).find(query).await
    }

    async fn get(&self, id: &DonationId) -> LedgerResult<Option<Donation>> {
        (**self).get(id).await
    }

    async fn patch(&self, id: &DonationId, patch: &DonationPatch) -> LedgerResult<Donation> {
        (**self).patch(id, patch).await
    }

    async fn create(&self, donation: NewDonation) -> LedgerResult<Donation> {
        (**self).create(donation).await
    }
}
