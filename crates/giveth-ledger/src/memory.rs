use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use giveth_types::{Donation, DonationId, NewDonation};

use crate::error::{LedgerError, LedgerResult};
use crate::patch::DonationPatch;
use crate::query::{DonationQuery, Page, SortOrder};
use crate::traits::DonationStore;

/// In-memory donation ledger for tests, simulations, and embedding.
pub struct InMemoryDonationStore {
    inner: RwLock<StoreState>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

#[derive(Default)]
struct StoreState {
    next_seq: u64,
    records: BTreeMap<u64, Donation>,
    index: HashMap<DonationId, u64>,
}

impl StoreState {
    fn insert(&mut self, donation: Donation) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(old) = self.index.insert(donation.id.clone(), seq) {
            self.records.remove(&old);
        }
        self.records.insert(seq, donation);
    }
}

impl InMemoryDonationStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Insert records as-is, keeping their ids and timestamps.
    pub fn seed(&self, donations: impl IntoIterator<Item = Donation>) -> LedgerResult<()> {
        let mut state = self.write_state()?;
        for donation in donations {
            state.insert(donation);
        }
        Ok(())
    }

    /// Make every subsequent `patch` and `create` fail with `Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `patch` and `create` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every record in insertion order.
    pub fn all(&self) -> LedgerResult<Vec<Donation>> {
        Ok(self.read_state()?.records.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.read_state().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_state(&self) -> LedgerResult<RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Unavailable("donation store read lock poisoned".into()))
    }

    fn write_state(&self) -> LedgerResult<RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("donation store write lock poisoned".into()))
    }

    fn check_writable(&self) -> LedgerResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("writes are disabled".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryDonationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DonationStore for InMemoryDonationStore {
    async fn find(&self, query: &DonationQuery) -> LedgerResult<Page<Donation>> {
        let state = self.read_state()?;
        let mut matched: Vec<(u64, &Donation)> = state
            .records
            .iter()
            .filter(|(_, d)| query.matches(d))
            .map(|(seq, d)| (*seq, d))
            .collect();

        matched.sort_by(|(sa, a), (sb, b)| (a.created_at, sa).cmp(&(b.created_at, sb)));
        if query.sort == SortOrder::CreatedAtDesc {
            matched.reverse();
        }

        let total = matched.len();
        let data = matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(_, d)| d.clone())
            .collect();

        Ok(Page {
            data,
            total,
            limit: query.limit,
            skip: query.skip,
        })
    }

    async fn get(&self, id: &DonationId) -> LedgerResult<Option<Donation>> {
        let state = self.read_state()?;
        Ok(state
            .index
            .get(id)
            .and_then(|seq| state.records.get(seq))
            .cloned())
    }

    async fn patch(&self, id: &DonationId, patch: &DonationPatch) -> LedgerResult<Donation> {
        self.check_writable()?;
        let mut state = self.write_state()?;
        let seq = *state
            .index
            .get(id)
            .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;
        let record = state
            .records
            .get_mut(&seq)
            .ok_or_else(|| LedgerError::DonationNotFound(id.clone()))?;

        let mut updated = record.clone();
        patch.apply_to(&mut updated)?;
        *record = updated.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(donation = %id, status = %updated.status, "patched donation");
        Ok(updated)
    }

    async fn create(&self, donation: NewDonation) -> LedgerResult<Donation> {
        self.check_writable()?;
        let record = donation.into_donation(DonationId::generate(), Utc::now());
        record.validate().map_err(|e| LedgerError::IntegrityViolation {
            id: record.id.clone(),
            reason: e.to_string(),
        })?;

        let mut state = self.write_state()?;
        state.insert(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(donation = %record.id, status = %record.status, "created donation");
        Ok(record)
    }
}
