use std::sync::Arc;

use futures::future::join_all;
use giveth_chain::{
    ChainError, ChainGateway, Contract, MultiTransferCall, SubmittedCall, TransferCall, WithdrawCall,
};
use giveth_ledger::{
    load_delegable, DelegableDonations, DelegationSource, DonationPatch, DonationStore,
    LedgerReconciler, LedgerResult, Successor,
};
use giveth_pledge::allocate;
use giveth_types::{
    Address, AdminId, Amount, DelegateTarget, Donation, DonationId, DonationStatus, EntityAccount,
    EntityKind, NewDonation, Party, TargetKind, TxHash,
};
use serde::Serialize;

use crate::config::DelegationConfig;
use crate::error::{DelegationError, DelegationResult};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::observer::DelegationObserver;
use crate::plan::{DelegationAction, DelegationPlan};

const INITIATE_FAILED: &str = "Unable to initiate the transaction";
const TRANSACTION_FAILED: &str = "There was a problem with the transaction";
const LEDGER_UPDATE_FAILED: &str = "Unable to update the donation in the ledger";
const DELEGATION_CAPPED: &str = "Only part of the requested amount can be delegated";
const RECORD_FAILED: &str = "Your donation has been initiated, however an error occurred when \
                             attempting to save it. It should appear within ~30 minutes";

/// How a submitted action ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum TxOutcome {
    /// Mined.
    Confirmed { tx_hash: TxHash, tx_link: String },
    /// Tracking failed with a known-benign error after the hash was seen;
    /// the transaction itself is believed to be fine.
    Unconfirmed { tx_hash: TxHash, tx_link: String },
    /// The observer declined submission.
    Cancelled,
}

impl TxOutcome {
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            Self::Confirmed { tx_hash, .. } | Self::Unconfirmed { tx_hash, .. } => Some(tx_hash),
            Self::Cancelled => None,
        }
    }

    pub fn tx_link(&self) -> Option<&str> {
        match self {
            Self::Confirmed { tx_link, .. } | Self::Unconfirmed { tx_link, .. } => Some(tx_link),
            Self::Cancelled => None,
        }
    }
}

/// The giver behind a fresh donation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GiverAccount {
    pub address: Address,
    /// On-chain admin index, once the giver has one.
    pub giver_id: Option<AdminId>,
}

/// `true` for the "unknown transaction" error some nodes raise while
/// tracking a transaction that was in fact broadcast. Only benign once a
/// hash has been observed.
pub fn is_benign_resubmission_error(error: &ChainError, hash_observed: bool) -> bool {
    hash_observed && error.to_string().contains("unknown transaction")
}

/// Ledger writes applied at the hash checkpoint.
enum LedgerUpdate {
    /// Per-record patches; the transaction hash is added to each.
    Patches(Vec<(DonationId, DonationPatch)>),
    /// Decrement the source and create one successor.
    Split {
        source: DonationId,
        decrement: Amount,
        status: Option<DonationStatus>,
        successor: Successor,
    },
}

/// Orchestrates donation actions across the chain and the ledger.
pub struct DonationService<S, G> {
    reconciler: LedgerReconciler<S>,
    gateway: G,
    config: DelegationConfig,
    notifier: Arc<dyn Notifier>,
}

impl<S: DonationStore, G: ChainGateway> DonationService<S, G> {
    pub fn new(store: S, gateway: G, config: DelegationConfig) -> Self {
        Self {
            reconciler: LedgerReconciler::new(store),
            gateway,
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &S {
        self.reconciler.store()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &DelegationConfig {
        &self.config
    }

    /// Oldest delegable donations of `source`, bounded by the configured
    /// distinct-pledge limit.
    pub async fn load_delegable(
        &self,
        source: &DelegationSource,
        token: &Address,
    ) -> DelegationResult<DelegableDonations> {
        Ok(load_delegable(self.store(), source, token, self.config.delegate_count_limit).await?)
    }

    /// Move `amount` out of `donations` (oldest first) to `delegate_to` in
    /// one multi-transfer.
    pub async fn delegate_multiple(
        &self,
        donations: &[Donation],
        amount: &Amount,
        delegate_to: &DelegateTarget,
        comment: Option<&str>,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        match self.prepare_delegate_multiple(donations, amount, delegate_to, comment) {
            Ok((plan, update)) => self.execute(plan, update, observer).await,
            Err(error) => self.abort(error, observer).await,
        }
    }

    /// Move `amount` of one donation to `delegate_to`.
    pub async fn delegate(
        &self,
        donation: &Donation,
        amount: &Amount,
        delegate_to: &DelegateTarget,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        match self.prepare_delegate(donation, amount, delegate_to) {
            Ok((plan, update)) => self.execute(plan, update, observer).await,
            Err(error) => self.abort(error, observer).await,
        }
    }

    /// Send a proposed delegation back to the delegate.
    pub async fn reject(
        &self,
        donation: &Donation,
        address: &Address,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        match self.prepare_reject(donation, address) {
            Ok((plan, update)) => self.execute(plan, update, observer).await,
            Err(error) => self.abort(error, observer).await,
        }
    }

    /// Accept a proposed delegation to the intended project.
    pub async fn commit(
        &self,
        donation: &Donation,
        address: &Address,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        match self.prepare_commit(donation, address) {
            Ok((plan, update)) => self.execute(plan, update, observer).await,
            Err(error) => self.abort(error, observer).await,
        }
    }

    /// Withdraw the remaining value of a donation.
    pub async fn refund(
        &self,
        donation: &Donation,
        address: &Address,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        match self.prepare_refund(donation, address) {
            Ok((plan, update)) => self.execute(plan, update, observer).await,
            Err(error) => self.abort(error, observer).await,
        }
    }

    /// Create the ledger record for a donation that just landed on-chain.
    ///
    /// Donations to a DAC stay owned by the giver with the DAC as delegate;
    /// any other recipient owns the donation.
    pub async fn record_donation(
        &self,
        giver: &GiverAccount,
        to_admin: &Party,
        amount: Amount,
        home_tx_hash: TxHash,
    ) -> DelegationResult<Donation> {
        let owner = match to_admin.kind {
            EntityKind::Dac => Party::new(
                giver.giver_id.unwrap_or(0),
                giver.address.as_str(),
                EntityKind::Giver,
            ),
            EntityKind::Giver | EntityKind::Campaign | EntityKind::Milestone => to_admin.bare(),
        };

        let mut new = NewDonation::new(amount, giver.address.clone(), owner, DonationStatus::Pending);
        new.home_tx_hash = Some(home_tx_hash);
        if to_admin.kind == EntityKind::Dac {
            new.delegate = Some(to_admin.bare());
        }

        match self.store().create(new).await {
            Ok(created) => {
                tracing::info!(
                    donation = %created.id,
                    owner = created.owner.admin_id,
                    amount = %created.amount,
                    "recorded new donation"
                );
                Ok(created)
            }
            Err(error) => {
                tracing::error!(error = %error, giver = %giver.address, "failed to record donation");
                self.notifier.notify(Notice::error(RECORD_FAILED, error.to_string()));
                Err(error.into())
            }
        }
    }

    fn prepare_delegate_multiple(
        &self,
        donations: &[Donation],
        amount: &Amount,
        delegate_to: &DelegateTarget,
        comment: Option<&str>,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        if delegate_to.kind == TargetKind::Dac {
            return Err(DelegationError::UnsupportedTarget(delegate_to.id.clone()));
        }
        let first = donations.first().ok_or(DelegationError::NothingToDelegate)?;
        let allocation = allocate(donations, amount);
        if allocation.is_empty() {
            return Err(DelegationError::NothingToDelegate);
        }

        let shortfall = allocation.shortfall();
        if !shortfall.is_zero() {
            tracing::warn!(
                requested = %amount,
                available = %allocation.total,
                shortfall = %shortfall,
                "delegation capped at available value"
            );
            self.notifier
                .notify(Notice::warning(DELEGATION_CAPPED, format!("short by {shortfall}")));
        }

        let (contract, from, sender_id) = match first.owner.kind {
            EntityKind::Campaign => {
                let account = controller(&first.owner)?;
                (
                    Contract::CampaignPlugin(plugin_of(&first.owner, account)?),
                    account.owner_address.clone(),
                    None,
                )
            }
            EntityKind::Giver | EntityKind::Dac | EntityKind::Milestone => {
                let delegate = first
                    .delegate
                    .as_ref()
                    .ok_or_else(|| DelegationError::MissingDelegate(first.id.clone()))?;
                (
                    Contract::LiquidPledging,
                    controller(delegate)?.owner_address.clone(),
                    Some(delegate.admin_id),
                )
            }
        };

        let call = MultiTransferCall {
            contract,
            from,
            sender_id,
            notes: allocation.encoded_notes()?,
            receiver_id: delegate_to.project_id,
            extra_gas: self.config.extra_gas,
        };

        let target = delegate_to.as_party();
        let patches = allocation
            .consumed
            .iter()
            .map(|consumed| {
                let mut patch = DonationPatch::new();
                if consumed.fully_donated {
                    patch = match donations[consumed.index].owner.kind {
                        EntityKind::Campaign => patch.with_owner(target.clone()),
                        _ => patch.with_intended_project(target.clone()),
                    };
                }
                (consumed.donation_id.clone(), patch)
            })
            .collect::<Vec<_>>();

        let plan = DelegationPlan {
            action: DelegationAction::DelegateMultiple,
            call: SubmittedCall::MultiTransfer(call),
            amount: allocation.total.clone(),
            shortfall,
            donations: patches.iter().map(|(id, _)| id.clone()).collect(),
            comment: comment.map(str::to_string),
        };
        Ok((plan, LedgerUpdate::Patches(patches)))
    }

    fn prepare_delegate(
        &self,
        donation: &Donation,
        amount: &Amount,
        delegate_to: &DelegateTarget,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        if amount.is_zero() || amount > &donation.amount_remaining {
            return Err(DelegationError::InvalidAmount {
                amount: amount.to_string(),
                remaining: donation.amount_remaining.to_string(),
            });
        }

        let acting = donation.acting_party();
        let from = controller(acting)?.owner_address.clone();
        let receiver = delegate_to.receiver_id();

        let call = match donation.owner.kind {
            EntityKind::Campaign => TransferCall::campaign_plugin(
                plugin_of(&donation.owner, controller(&donation.owner)?)?,
                from,
                donation.pledge_id,
                amount.clone(),
                receiver,
            ),
            EntityKind::Giver | EntityKind::Dac | EntityKind::Milestone => TransferCall::liquid_pledging(
                from,
                donation.sender_id(),
                donation.pledge_id,
                amount.clone(),
                receiver,
            ),
        };

        let target = delegate_to.as_party();
        let successor = if donation.has_active_delegate() {
            Successor::of(donation, amount.clone(), DonationStatus::ToApprove)
                .delegated_to(acting.clone())
                .intended_for(target)
        } else {
            Successor::of(donation, amount.clone(), DonationStatus::Committed).owned_by(target)
        };

        let plan = DelegationPlan {
            action: DelegationAction::Delegate,
            call: SubmittedCall::Transfer(call),
            amount: amount.clone(),
            shortfall: Amount::zero(),
            donations: vec![donation.id.clone()],
            comment: None,
        };
        let update = LedgerUpdate::Split {
            source: donation.id.clone(),
            decrement: amount.clone(),
            status: None,
            successor,
        };
        Ok((plan, update))
    }

    fn prepare_reject(
        &self,
        donation: &Donation,
        address: &Address,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        let remaining = open_remaining(donation)?;
        let delegate = donation
            .delegate
            .as_ref()
            .ok_or_else(|| DelegationError::MissingDelegate(donation.id.clone()))?;

        let call = TransferCall::liquid_pledging(
            address.clone(),
            donation.owner.admin_id,
            donation.pledge_id,
            remaining.clone(),
            delegate.admin_id,
        );
        let successor = Successor::of(donation, remaining.clone(), DonationStatus::ToApprove)
            .delegated_to(delegate.clone())
            .as_return();

        self.close_out(DelegationAction::Reject, donation, call.into(), DonationStatus::Rejected, successor)
    }

    fn prepare_commit(
        &self,
        donation: &Donation,
        address: &Address,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        let remaining = open_remaining(donation)?;
        let project = donation
            .intended_project
            .as_ref()
            .ok_or_else(|| DelegationError::MissingIntendedProject(donation.id.clone()))?;

        let call = TransferCall::liquid_pledging(
            address.clone(),
            donation.owner.admin_id,
            donation.pledge_id,
            remaining.clone(),
            project.admin_id,
        );
        let successor =
            Successor::of(donation, remaining.clone(), DonationStatus::Committed).owned_by(project.clone());

        self.close_out(DelegationAction::Commit, donation, call.into(), DonationStatus::Committed, successor)
    }

    fn prepare_refund(
        &self,
        donation: &Donation,
        address: &Address,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        let remaining = open_remaining(donation)?;
        let call = WithdrawCall {
            from: address.clone(),
            pledge_id: donation.pledge_id,
            amount: remaining.clone(),
        };
        let successor = Successor::of(donation, remaining.clone(), DonationStatus::Paying);

        self.close_out(
            DelegationAction::Refund,
            donation,
            SubmittedCall::Withdraw(call),
            DonationStatus::Paying,
            successor,
        )
    }

    /// Plan for an action that moves the whole remaining value and closes
    /// the source with `status`. The move must be allowed before anything is
    /// submitted.
    fn close_out(
        &self,
        action: DelegationAction,
        donation: &Donation,
        call: SubmittedCall,
        status: DonationStatus,
        successor: Successor,
    ) -> DelegationResult<(DelegationPlan, LedgerUpdate)> {
        if !donation.status.can_transition_to(status) {
            return Err(DelegationError::InvalidTransition {
                donation: donation.id.clone(),
                from: donation.status,
                to: status,
            });
        }
        let plan = DelegationPlan {
            action,
            call,
            amount: donation.amount_remaining.clone(),
            shortfall: Amount::zero(),
            donations: vec![donation.id.clone()],
            comment: None,
        };
        let update = LedgerUpdate::Split {
            source: donation.id.clone(),
            decrement: donation.amount_remaining.clone(),
            status: Some(status),
            successor,
        };
        Ok((plan, update))
    }

    async fn abort(
        &self,
        error: DelegationError,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        tracing::warn!(error = %error, "action not submitted");
        self.notifier.notify(Notice::error(INITIATE_FAILED, error.to_string()));
        observer.on_error(&error).await;
        Err(error)
    }

    async fn execute(
        &self,
        plan: DelegationPlan,
        update: LedgerUpdate,
        observer: &dyn DelegationObserver,
    ) -> DelegationResult<TxOutcome> {
        if !observer.confirm_submission(&plan).await {
            tracing::info!(action = %plan.action, "submission declined");
            observer.on_cancel().await;
            return Ok(TxOutcome::Cancelled);
        }

        tracing::info!(action = %plan.action, call = %plan.call, amount = %plan.amount, "submitting transaction");
        let submitted = match plan.call.clone() {
            SubmittedCall::Transfer(call) => self.gateway.transfer(call).await,
            SubmittedCall::MultiTransfer(call) => self.gateway.multi_transfer(call).await,
            SubmittedCall::Withdraw(call) => self.gateway.withdraw(call).await,
        };
        let mut handle = match submitted {
            Ok(handle) => handle,
            Err(error) => return self.abort(error.into(), observer).await,
        };

        let Some(tx_hash) = handle.hash_observed().await else {
            let error = match handle.confirmation().await {
                Err(error) => error,
                Ok(_) => ChainError::HandleClosed("transaction hash"),
            };
            return self.abort(error.into(), observer).await;
        };
        let tx_link = self.config.tx_link(&tx_hash);
        tracing::info!(action = %plan.action, tx_hash = %tx_hash, "transaction hash observed");

        match self.reconcile(update, &tx_hash).await {
            Ok(()) => observer.on_created(&tx_link).await,
            Err(error) => {
                tracing::error!(action = %plan.action, tx_hash = %tx_hash, error = %error, "ledger update failed");
                self.notifier.notify(Notice::error(LEDGER_UPDATE_FAILED, error.to_string()));
                observer.on_error(&DelegationError::Ledger(error)).await;
            }
        }

        match handle.confirmation().await {
            Ok(receipt) => {
                tracing::info!(
                    action = %plan.action,
                    tx_hash = %tx_hash,
                    block = receipt.block_number,
                    "transaction mined"
                );
                observer.on_success(&tx_link).await;
                Ok(TxOutcome::Confirmed { tx_hash, tx_link })
            }
            Err(error) if is_benign_resubmission_error(&error, true) => {
                tracing::debug!(tx_hash = %tx_hash, error = %error, "ignoring benign tracking error");
                Ok(TxOutcome::Unconfirmed { tx_hash, tx_link })
            }
            Err(error) => {
                tracing::error!(action = %plan.action, tx_hash = %tx_hash, error = %error, "transaction failed");
                self.notifier.notify(Notice::error(TRANSACTION_FAILED, tx_link));
                let error = DelegationError::Chain(error);
                observer.on_error(&error).await;
                Err(error)
            }
        }
    }

    async fn reconcile(&self, update: LedgerUpdate, tx_hash: &TxHash) -> LedgerResult<()> {
        match update {
            LedgerUpdate::Patches(patches) => {
                let writes = patches.into_iter().map(|(id, patch)| {
                    let patch = patch.with_tx_hash(tx_hash.clone());
                    async move { self.reconciler.apply_patch(&id, &patch).await }
                });
                join_all(writes)
                    .await
                    .into_iter()
                    .collect::<LedgerResult<Vec<_>>>()?;
                Ok(())
            }
            LedgerUpdate::Split {
                source,
                decrement,
                status,
                successor,
            } => {
                let decremented = self.reconciler.decrement_remaining(&source, &decrement, status).await;
                let created = self
                    .reconciler
                    .create_successor(successor.with_tx_hash(tx_hash.clone()))
                    .await;
                decremented?;
                created?;
                Ok(())
            }
        }
    }
}

fn controller(party: &Party) -> DelegationResult<&EntityAccount> {
    party
        .account
        .as_ref()
        .ok_or_else(|| DelegationError::MissingAccount(format!("{} {}", party.kind, party.type_id)))
}

fn plugin_of(owner: &Party, account: &EntityAccount) -> DelegationResult<Address> {
    account
        .plugin_address
        .clone()
        .ok_or_else(|| DelegationError::MissingAccount(format!("plugin of {} {}", owner.kind, owner.type_id)))
}

fn open_remaining(donation: &Donation) -> DelegationResult<&Amount> {
    if donation.is_closed() {
        return Err(DelegationError::DonationClosed(donation.id.clone()));
    }
    Ok(&donation.amount_remaining)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use giveth_chain::{Script, ScriptedGateway};
    use giveth_ledger::{DonationQuery, InMemoryDonationStore};
    use giveth_pledge::PledgeNote;
    use giveth_types::PledgeId;

    use super::*;
    use crate::notify::CollectingNotifier;
    use crate::observer::{NoOpObserver, ObserverEvent, RecordingObserver};

    const GIVER: &str = "0x1000000000000000000000000000000000000001";
    const DAC_OWNER: &str = "0x3000000000000000000000000000000000000003";
    const CAMPAIGN_OWNER: &str = "0x5000000000000000000000000000000000000005";
    const CAMPAIGN_PLUGIN: &str = "0x5500000000000000000000000000000000000055";
    const CALLER: &str = "0x9000000000000000000000000000000000000009";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn amt(v: u64) -> Amount {
        Amount::from(v)
    }

    fn giver() -> Party {
        Party::new(1, GIVER, EntityKind::Giver).with_account(EntityAccount::new(addr(GIVER)))
    }

    fn dac() -> Party {
        Party::new(3, "dac-3", EntityKind::Dac).with_account(EntityAccount::new(addr(DAC_OWNER)))
    }

    fn campaign() -> Party {
        Party::new(5, "camp-5", EntityKind::Campaign).with_account(
            EntityAccount::new(addr(CAMPAIGN_OWNER)).with_plugin(addr(CAMPAIGN_PLUGIN)),
        )
    }

    fn milestone() -> DelegateTarget {
        DelegateTarget::milestone("milestone-9", 9)
    }

    fn donation(id: &str, pledge: u64, remaining: u64, owner: Party, status: DonationStatus, age: i64) -> Donation {
        let mut new = NewDonation::new(amt(remaining), addr(GIVER), owner, status);
        new.pledge_id = PledgeId(pledge);
        new.into_donation(DonationId::new(id), Utc::now() - Duration::minutes(age))
    }

    fn waiting_on_dac(id: &str, pledge: u64, remaining: u64, age: i64) -> Donation {
        let mut d = donation(id, pledge, remaining, giver(), DonationStatus::Waiting, age);
        d.delegate = Some(dac());
        d
    }

    fn proposed(id: &str, remaining: u64) -> Donation {
        let mut d = waiting_on_dac(id, 4, remaining, 0);
        d.status = DonationStatus::ToApprove;
        d.intended_project = Some(milestone().as_party());
        d
    }

    struct Harness {
        service: DonationService<InMemoryDonationStore, ScriptedGateway>,
        notifier: Arc<CollectingNotifier>,
    }

    impl Harness {
        fn new(donations: Vec<Donation>, scripts: Vec<Script>) -> Self {
            let store = InMemoryDonationStore::new();
            store.seed(donations).unwrap();
            let notifier = Arc::new(CollectingNotifier::new());
            let service = DonationService::new(
                store,
                ScriptedGateway::with_scripts(scripts),
                DelegationConfig::default(),
            )
            .with_notifier(notifier.clone());
            Self { service, notifier }
        }

        async fn get(&self, id: &str) -> Donation {
            self.service.store().get(&DonationId::new(id)).await.unwrap().unwrap()
        }

        async fn children(&self, id: &str) -> Vec<Donation> {
            self.service
                .store()
                .find(&DonationQuery::new().children_of(DonationId::new(id)))
                .await
                .unwrap()
                .data
        }

        fn calls(&self) -> Vec<SubmittedCall> {
            self.service.gateway().calls().unwrap()
        }
    }

    fn note(amount: u64, pledge: u64) -> String {
        PledgeNote::new(amt(amount), PledgeId(pledge)).encode().unwrap()
    }

    #[test]
    fn benign_error_requires_observed_hash() {
        let error = ChainError::Transaction("Error: unknown transaction 0xabc".into());
        assert!(is_benign_resubmission_error(&error, true));
        assert!(!is_benign_resubmission_error(&error, false));
        assert!(!is_benign_resubmission_error(&ChainError::Transaction("out of gas".into()), true));
    }

    #[tokio::test]
    async fn delegate_multiple_splits_the_last_donation() {
        let sources = vec![waiting_on_dac("d0", 1, 100, 2), waiting_on_dac("d1", 2, 50, 1)];
        let h = Harness::new(sources.clone(), vec![]);
        let observer = RecordingObserver::new();

        let outcome = h
            .service
            .delegate_multiple(&sources, &amt(120), &milestone(), Some("for the build"), &observer)
            .await
            .unwrap();

        let TxOutcome::Confirmed { tx_hash, tx_link } = outcome else {
            panic!("expected confirmed outcome");
        };
        assert_eq!(tx_link, format!("https://etherscan.io/tx/{tx_hash}"));
        assert_eq!(
            observer.events(),
            vec![ObserverEvent::Created(tx_link.clone()), ObserverEvent::Success(tx_link)]
        );

        let calls = h.calls();
        let SubmittedCall::MultiTransfer(call) = &calls[0] else {
            panic!("expected a multi-transfer");
        };
        assert_eq!(call.contract, Contract::LiquidPledging);
        assert_eq!(call.from, addr(DAC_OWNER));
        assert_eq!(call.sender_id, Some(3));
        assert_eq!(call.receiver_id, 9);
        assert_eq!(call.extra_gas, 100_000);
        assert_eq!(call.notes, vec![note(100, 1), note(20, 2)]);

        let full = h.get("d0").await;
        assert_eq!(full.tx_hash.as_ref(), Some(&tx_hash));
        assert_eq!(full.intended_project.map(|p| p.admin_id), Some(9));
        assert_eq!(full.owner.admin_id, 1);

        let partial = h.get("d1").await;
        assert_eq!(partial.tx_hash.as_ref(), Some(&tx_hash));
        assert!(partial.intended_project.is_none());
        assert_eq!(partial.amount_remaining, amt(50));
    }

    #[tokio::test]
    async fn delegate_multiple_from_campaign_reassigns_owner() {
        let sources = vec![
            donation("c0", 7, 30, campaign(), DonationStatus::Committed, 1),
            donation("c1", 8, 30, campaign(), DonationStatus::Committed, 0),
        ];
        let h = Harness::new(sources.clone(), vec![]);

        h.service
            .delegate_multiple(&sources, &amt(60), &milestone(), None, &NoOpObserver)
            .await
            .unwrap();

        let SubmittedCall::MultiTransfer(call) = &h.calls()[0] else {
            panic!("expected a multi-transfer");
        };
        assert_eq!(call.contract, Contract::CampaignPlugin(addr(CAMPAIGN_PLUGIN)));
        assert_eq!(call.from, addr(CAMPAIGN_OWNER));
        assert_eq!(call.sender_id, None);

        for id in ["c0", "c1"] {
            let record = h.get(id).await;
            assert_eq!(record.owner.admin_id, 9);
            assert_eq!(record.owner.kind, EntityKind::Milestone);
            assert!(record.owner.account.is_none());
        }
    }

    #[tokio::test]
    async fn delegate_multiple_with_nothing_available() {
        let sources = vec![waiting_on_dac("d0", 1, 0, 0)];
        let h = Harness::new(sources.clone(), vec![]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .delegate_multiple(&sources, &amt(10), &milestone(), None, &observer)
            .await
            .unwrap_err();

        assert!(matches!(error, DelegationError::NothingToDelegate));
        assert!(h.calls().is_empty());
        assert_eq!(observer.errors(), vec!["nothing to delegate"]);

        let empty: Vec<Donation> = Vec::new();
        assert!(matches!(
            h.service
                .delegate_multiple(&empty, &amt(10), &milestone(), None, &observer)
                .await
                .unwrap_err(),
            DelegationError::NothingToDelegate
        ));
    }

    #[tokio::test]
    async fn delegate_multiple_refuses_dac_target() {
        let sources = vec![waiting_on_dac("d0", 1, 100, 0)];
        let h = Harness::new(sources.clone(), vec![]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .delegate_multiple(&sources, &amt(100), &DelegateTarget::dac("dac-7", 7), None, &observer)
            .await
            .unwrap_err();

        assert!(matches!(error, DelegationError::UnsupportedTarget(_)));
        assert!(h.calls().is_empty());
        assert_eq!(h.service.store().write_count(), 0);
        assert!(h.get("d0").await.intended_project.is_none());
        assert_eq!(h.notifier.messages(), vec![INITIATE_FAILED]);
    }

    #[tokio::test]
    async fn delegate_multiple_warns_when_capped() {
        let sources = vec![waiting_on_dac("d0", 1, 100, 0)];
        let h = Harness::new(sources.clone(), vec![]);

        h.service
            .delegate_multiple(&sources, &amt(130), &milestone(), None, &NoOpObserver)
            .await
            .unwrap();

        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, crate::notify::Severity::Warning);
        assert_eq!(notices[0].detail.as_deref(), Some("short by 30"));
        let SubmittedCall::MultiTransfer(call) = &h.calls()[0] else {
            panic!("expected a multi-transfer");
        };
        assert_eq!(call.notes, vec![note(100, 1)]);
    }

    #[tokio::test]
    async fn delegate_multiple_ledger_failure_still_awaits_mining() {
        let sources = vec![waiting_on_dac("d0", 1, 100, 2), waiting_on_dac("d1", 2, 50, 1)];
        let h = Harness::new(sources.clone(), vec![]);
        h.service.store().fail_writes(true);
        let observer = RecordingObserver::new();

        let outcome = h
            .service
            .delegate_multiple(&sources, &amt(120), &milestone(), None, &observer)
            .await
            .unwrap();

        assert!(matches!(outcome, TxOutcome::Confirmed { .. }));
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ObserverEvent::Error(e) if e.starts_with("ledger error")));
        assert!(matches!(&events[1], ObserverEvent::Success(_)));
        assert_eq!(h.notifier.messages(), vec![LEDGER_UPDATE_FAILED]);
        assert!(h.get("d0").await.tx_hash.is_none());
    }

    #[tokio::test]
    async fn rejected_submission_leaves_ledger_untouched() {
        let sources = vec![waiting_on_dac("d0", 1, 100, 0)];
        let h = Harness::new(sources.clone(), vec![Script::RejectSubmission("user denied".into())]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .delegate_multiple(&sources, &amt(50), &milestone(), None, &observer)
            .await
            .unwrap_err();

        assert!(matches!(error, DelegationError::Chain(ChainError::SubmissionRejected(_))));
        assert_eq!(h.service.store().write_count(), 0);
        assert_eq!(observer.events().len(), 1);
        assert_eq!(h.notifier.messages(), vec![INITIATE_FAILED]);
    }

    #[tokio::test]
    async fn failure_before_hash_leaves_ledger_untouched() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![Script::FailBeforeHash("nonce too low".into())]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .delegate(&source, &amt(10), &milestone(), &observer)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "chain error: nonce too low");
        assert_eq!(h.service.store().write_count(), 0);
        assert_eq!(observer.errors(), vec!["chain error: nonce too low"]);
        assert_eq!(h.notifier.messages(), vec![INITIATE_FAILED]);
    }

    #[tokio::test]
    async fn unknown_transaction_after_hash_is_suppressed() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(
            vec![source.clone()],
            vec![Script::FailAfterHash("unknown transaction".into())],
        );
        let observer = RecordingObserver::new();

        let outcome = h
            .service
            .delegate(&source, &amt(10), &milestone(), &observer)
            .await
            .unwrap();

        assert!(matches!(outcome, TxOutcome::Unconfirmed { .. }));
        let events = observer.events();
        assert!(!events.iter().any(|e| matches!(e, ObserverEvent::Error(_) | ObserverEvent::Success(_))));
        assert!(matches!(events.as_slice(), [ObserverEvent::Created(_)]));
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn other_failure_after_hash_reports_the_link() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![Script::FailAfterHash("out of gas".into())]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .delegate(&source, &amt(10), &milestone(), &observer)
            .await
            .unwrap_err();

        assert!(matches!(error, DelegationError::Chain(ChainError::Transaction(_))));
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, TRANSACTION_FAILED);
        assert!(notices[0].detail.as_deref().unwrap().starts_with("https://etherscan.io/tx/0x"));
        assert!(matches!(
            observer.events().as_slice(),
            [ObserverEvent::Created(_), ObserverEvent::Error(_)]
        ));
    }

    #[tokio::test]
    async fn ledger_failure_still_awaits_the_transaction() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![]);
        h.service.store().fail_writes(true);
        let observer = RecordingObserver::new();

        let outcome = h
            .service
            .delegate(&source, &amt(10), &milestone(), &observer)
            .await
            .unwrap();

        assert!(matches!(outcome, TxOutcome::Confirmed { .. }));
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ObserverEvent::Error(e) if e.starts_with("ledger error")));
        assert!(matches!(&events[1], ObserverEvent::Success(_)));
        assert_eq!(h.notifier.messages(), vec![LEDGER_UPDATE_FAILED]);
    }

    #[tokio::test]
    async fn declined_confirmation_cancels() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![]);
        let observer = RecordingObserver::declining();

        let outcome = h
            .service
            .delegate(&source, &amt(10), &milestone(), &observer)
            .await
            .unwrap();

        assert_eq!(outcome, TxOutcome::Cancelled);
        assert_eq!(observer.events(), vec![ObserverEvent::Cancelled]);
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn delegate_by_delegate_proposes_to_project() {
        let source = waiting_on_dac("d0", 4, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .delegate(&source, &amt(40), &milestone(), &NoOpObserver)
            .await
            .unwrap();

        assert_eq!(
            h.calls()[0],
            SubmittedCall::Transfer(TransferCall::liquid_pledging(addr(DAC_OWNER), 3, PledgeId(4), amt(40), 9))
        );
        assert_eq!(h.get("d0").await.amount_remaining, amt(60));

        let successors = h.children("d0").await;
        assert_eq!(successors.len(), 1);
        let successor = &successors[0];
        assert_eq!(successor.status, DonationStatus::ToApprove);
        assert_eq!(successor.amount, amt(40));
        assert_eq!(successor.amount_remaining, amt(40));
        assert_eq!(successor.pledge_id, PledgeId::UNPLEDGED);
        assert_eq!(successor.owner.admin_id, 1);
        assert_eq!(successor.delegate.as_ref().map(|d| d.admin_id), Some(3));
        assert_eq!(successor.intended_project.as_ref().map(|p| p.admin_id), Some(9));
        assert!(!successor.mined);
    }

    #[tokio::test]
    async fn delegate_by_owner_commits_to_project() {
        let source = donation("g0", 2, 100, giver(), DonationStatus::Waiting, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .delegate(&source, &amt(100), &DelegateTarget::campaign("camp-12", 12), &NoOpObserver)
            .await
            .unwrap();

        let SubmittedCall::Transfer(call) = &h.calls()[0] else {
            panic!("expected a transfer");
        };
        assert_eq!(call.from, addr(GIVER));
        assert_eq!(call.sender_id, Some(1));
        assert_eq!(call.receiver_id, 12);

        assert!(h.get("g0").await.is_closed());
        let successor = &h.children("g0").await[0];
        assert_eq!(successor.status, DonationStatus::Committed);
        assert_eq!(successor.owner.admin_id, 12);
        assert_eq!(successor.owner.kind, EntityKind::Campaign);
    }

    #[tokio::test]
    async fn delegate_by_owner_to_dac_commits_to_it() {
        let source = donation("g0", 2, 100, giver(), DonationStatus::Pending, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .delegate(&source, &amt(30), &DelegateTarget::dac("dac-7", 7), &NoOpObserver)
            .await
            .unwrap();

        let SubmittedCall::Transfer(call) = &h.calls()[0] else {
            panic!("expected a transfer");
        };
        assert_eq!(call.receiver_id, 7);
        let successor = &h.children("g0").await[0];
        assert_eq!(successor.status, DonationStatus::Committed);
        assert_eq!(successor.owner.admin_id, 7);
        assert_eq!(successor.owner.kind, EntityKind::Dac);
        assert!(successor.delegate.is_none());
    }

    #[tokio::test]
    async fn delegate_from_campaign_uses_plugin() {
        let source = donation("c0", 6, 80, campaign(), DonationStatus::Committed, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .delegate(&source, &amt(80), &milestone(), &NoOpObserver)
            .await
            .unwrap();

        assert_eq!(
            h.calls()[0],
            SubmittedCall::Transfer(TransferCall::campaign_plugin(
                addr(CAMPAIGN_PLUGIN),
                addr(CAMPAIGN_OWNER),
                PledgeId(6),
                amt(80),
                9,
            ))
        );
    }

    #[tokio::test]
    async fn delegate_rejects_out_of_range_amounts() {
        let source = waiting_on_dac("d0", 1, 100, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        for amount in [amt(0), amt(101)] {
            let error = h
                .service
                .delegate(&source, &amount, &milestone(), &NoOpObserver)
                .await
                .unwrap_err();
            assert!(matches!(error, DelegationError::InvalidAmount { .. }));
        }
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn delegate_without_controller_account() {
        let mut source = waiting_on_dac("d0", 1, 100, 0);
        source.delegate = Some(Party::new(3, "dac-3", EntityKind::Dac));
        let h = Harness::new(vec![source.clone()], vec![]);

        let error = h
            .service
            .delegate(&source, &amt(1), &milestone(), &NoOpObserver)
            .await
            .unwrap_err();
        assert!(matches!(error, DelegationError::MissingAccount(_)));
    }

    #[tokio::test]
    async fn reject_returns_value_to_delegate() {
        let source = proposed("p0", 70);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .reject(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap();

        assert_eq!(
            h.calls()[0],
            SubmittedCall::Transfer(TransferCall::liquid_pledging(addr(CALLER), 1, PledgeId(4), amt(70), 3))
        );
        let closed = h.get("p0").await;
        assert_eq!(closed.status, DonationStatus::Rejected);
        assert!(closed.is_closed());

        let successor = &h.children("p0").await[0];
        assert_eq!(successor.status, DonationStatus::ToApprove);
        assert!(successor.is_return);
        assert_eq!(successor.amount, amt(70));
        assert_eq!(successor.owner.admin_id, 1);
        assert_eq!(successor.delegate.as_ref().map(|d| d.admin_id), Some(3));
    }

    #[tokio::test]
    async fn reject_refuses_committed_donation() {
        let mut source = waiting_on_dac("c0", 4, 25, 0);
        source.status = DonationStatus::Committed;
        let h = Harness::new(vec![source.clone()], vec![]);
        let observer = RecordingObserver::new();

        let error = h
            .service
            .reject(&source, &addr(CALLER), &observer)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            DelegationError::InvalidTransition {
                from: DonationStatus::Committed,
                to: DonationStatus::Rejected,
                ..
            }
        ));
        assert!(h.calls().is_empty());
        assert_eq!(h.service.store().write_count(), 0);
        assert!(h.children("c0").await.is_empty());
        assert_eq!(h.get("c0").await.amount_remaining, amt(25));
        assert_eq!(observer.errors().len(), 1);
        assert_eq!(h.notifier.messages(), vec![INITIATE_FAILED]);
    }

    #[tokio::test]
    async fn commit_refuses_rejected_donation() {
        let mut source = proposed("p0", 70);
        source.status = DonationStatus::Rejected;
        let h = Harness::new(vec![source.clone()], vec![]);

        let error = h
            .service
            .commit(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap_err();
        assert!(matches!(error, DelegationError::InvalidTransition { .. }));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn close_out_actions_report_chain_failure_after_hash() {
        let proposal = proposed("p0", 70);
        let committed = donation("c0", 6, 25, campaign(), DonationStatus::Committed, 0);

        for action in [DelegationAction::Reject, DelegationAction::Commit, DelegationAction::Refund] {
            let source = match action {
                DelegationAction::Refund => committed.clone(),
                _ => proposal.clone(),
            };
            let h = Harness::new(vec![source.clone()], vec![Script::FailAfterHash("out of gas".into())]);
            let observer = RecordingObserver::new();

            let result = match action {
                DelegationAction::Reject => h.service.reject(&source, &addr(CALLER), &observer).await,
                DelegationAction::Commit => h.service.commit(&source, &addr(CALLER), &observer).await,
                _ => h.service.refund(&source, &addr(CALLER), &observer).await,
            };

            assert!(
                matches!(result, Err(DelegationError::Chain(ChainError::Transaction(_)))),
                "{action}"
            );
            assert!(
                matches!(
                    observer.events().as_slice(),
                    [ObserverEvent::Created(_), ObserverEvent::Error(_)]
                ),
                "{action}"
            );
            let notices = h.notifier.notices();
            assert_eq!(notices.len(), 1, "{action}");
            assert_eq!(notices[0].message, TRANSACTION_FAILED);
            assert!(notices[0].detail.as_deref().unwrap().starts_with("https://etherscan.io/tx/0x"));
            assert!(h.get(source.id.as_str()).await.is_closed(), "{action}");
            assert_eq!(h.children(source.id.as_str()).await.len(), 1, "{action}");
        }
    }

    #[tokio::test]
    async fn commit_moves_value_to_intended_project() {
        let source = proposed("p0", 70);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .commit(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap();

        assert_eq!(
            h.calls()[0],
            SubmittedCall::Transfer(TransferCall::liquid_pledging(addr(CALLER), 1, PledgeId(4), amt(70), 9))
        );
        let closed = h.get("p0").await;
        assert_eq!(closed.status, DonationStatus::Committed);
        assert!(closed.is_closed());

        let successor = &h.children("p0").await[0];
        assert_eq!(successor.status, DonationStatus::Committed);
        assert_eq!(successor.owner.admin_id, 9);
        assert_eq!(successor.owner.kind, EntityKind::Milestone);
    }

    #[tokio::test]
    async fn commit_requires_intended_project() {
        let mut source = proposed("p0", 70);
        source.intended_project = None;
        let h = Harness::new(vec![source.clone()], vec![]);

        let error = h
            .service
            .commit(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap_err();
        assert!(matches!(error, DelegationError::MissingIntendedProject(_)));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn refund_withdraws_remaining_value() {
        let source = donation("c0", 6, 25, campaign(), DonationStatus::Committed, 0);
        let h = Harness::new(vec![source.clone()], vec![]);

        h.service
            .refund(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap();

        assert_eq!(
            h.calls()[0],
            SubmittedCall::Withdraw(WithdrawCall {
                from: addr(CALLER),
                pledge_id: PledgeId(6),
                amount: amt(25),
            })
        );
        let closed = h.get("c0").await;
        assert_eq!(closed.status, DonationStatus::Paying);
        assert!(closed.is_closed());

        let successor = &h.children("c0").await[0];
        assert_eq!(successor.status, DonationStatus::Paying);
        assert_eq!(successor.owner.admin_id, 5);
    }

    #[tokio::test]
    async fn closed_donation_cannot_be_refunded() {
        let source = donation("c0", 6, 0, campaign(), DonationStatus::Committed, 0);
        let h = Harness::new(vec![source.clone()], vec![]);
        let error = h
            .service
            .refund(&source, &addr(CALLER), &NoOpObserver)
            .await
            .unwrap_err();
        assert!(matches!(error, DelegationError::DonationClosed(_)));
    }

    #[tokio::test]
    async fn record_donation_to_dac_keeps_giver_as_owner() {
        let h = Harness::new(vec![], vec![]);
        let account = GiverAccount { address: addr(GIVER), giver_id: Some(11) };
        let hash = TxHash::random();

        let created = h
            .service
            .record_donation(&account, &dac(), amt(500), hash.clone())
            .await
            .unwrap();

        assert_eq!(created.status, DonationStatus::Pending);
        assert_eq!(created.owner.kind, EntityKind::Giver);
        assert_eq!(created.owner.admin_id, 11);
        assert_eq!(created.owner.type_id, GIVER);
        assert_eq!(created.delegate.as_ref().map(|d| d.admin_id), Some(3));
        assert!(created.delegate.as_ref().unwrap().account.is_none());
        assert_eq!(created.home_tx_hash, Some(hash));
        assert_eq!(created.amount_remaining, amt(500));
    }

    #[tokio::test]
    async fn record_donation_to_campaign_makes_it_owner() {
        let h = Harness::new(vec![], vec![]);
        let account = GiverAccount { address: addr(GIVER), giver_id: None };

        let created = h
            .service
            .record_donation(&account, &campaign(), amt(5), TxHash::random())
            .await
            .unwrap();

        assert_eq!(created.owner.admin_id, 5);
        assert!(created.delegate.is_none());
    }

    #[tokio::test]
    async fn record_donation_failure_is_notified() {
        let h = Harness::new(vec![], vec![]);
        h.service.store().fail_writes(true);
        let account = GiverAccount { address: addr(GIVER), giver_id: None };

        let error = h
            .service
            .record_donation(&account, &campaign(), amt(5), TxHash::random())
            .await
            .unwrap_err();

        assert!(matches!(error, DelegationError::Ledger(_)));
        assert_eq!(h.notifier.messages(), vec![RECORD_FAILED]);
    }

    #[tokio::test]
    async fn load_delegable_uses_configured_limit() {
        let mut donations: Vec<Donation> = (0..12)
            .map(|i| waiting_on_dac(&format!("d{i}"), i as u64 + 1, 1, 100 - i))
            .collect();
        let token = addr("0x0000000000000000000000000000000000000000");
        for d in &mut donations {
            d.delegate = Some(Party::new(3, "dac-3", EntityKind::Dac));
            d.token_address = Some(token.clone());
        }
        let h = Harness::new(donations, vec![]);

        let loaded = h
            .service
            .load_delegable(
                &DelegationSource::Dac { delegate_id: 3, type_id: "dac-3".into() },
                &token,
            )
            .await
            .unwrap();

        assert_eq!(loaded.donations.len(), 10);
        assert_eq!(loaded.total, 12);
        assert!(loaded.is_limited());
    }
}
