use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use giveth_types::TxHash;

use crate::calls::{MultiTransferCall, SubmittedCall, TransferCall, WithdrawCall};
use crate::error::{ChainError, ChainResult};
use crate::gateway::ChainGateway;
use crate::handle::{TxHandle, TxReceipt};

/// Outcome the scripted gateway plays back for one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Script {
    /// Hash observed, then mined.
    Mined,
    /// Refused at submission; no handle is returned.
    RejectSubmission(String),
    /// Handle returned, but the transaction fails before a hash is known.
    FailBeforeHash(String),
    /// Hash observed, then tracking fails with this message.
    FailAfterHash(String),
}

/// In-process gateway that records calls and plays back scripted outcomes.
///
/// Submissions consume scripts in order; once the queue is empty every
/// submission is mined.
pub struct ScriptedGateway {
    scripts: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<SubmittedCall>>,
    block: AtomicU64,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            block: AtomicU64::new(1),
        }
    }

    pub fn with_scripts(scripts: impl IntoIterator<Item = Script>) -> Self {
        let gateway = Self::new();
        if let Ok(mut queue) = gateway.scripts.lock() {
            queue.extend(scripts);
        }
        gateway
    }

    pub fn push_script(&self, script: Script) -> ChainResult<()> {
        lock(&self.scripts)?.push_back(script);
        Ok(())
    }

    /// Every call that reached the gateway, rejected ones included.
    pub fn calls(&self) -> ChainResult<Vec<SubmittedCall>> {
        Ok(lock(&self.calls)?.clone())
    }

    fn submit(&self, call: SubmittedCall) -> ChainResult<TxHandle> {
        tracing::debug!(call = %call, "scripted submission");
        lock(&self.calls)?.push(call);
        let script = lock(&self.scripts)?.pop_front().unwrap_or(Script::Mined);

        let (mut reporter, handle) = TxHandle::channel();
        match script {
            Script::Mined => {
                let tx_hash = TxHash::random();
                reporter.hash_observed(tx_hash.clone());
                reporter.mined(TxReceipt {
                    tx_hash,
                    block_number: self.block.fetch_add(1, Ordering::SeqCst),
                });
            }
            Script::RejectSubmission(reason) => return Err(ChainError::SubmissionRejected(reason)),
            Script::FailBeforeHash(message) => reporter.failed(ChainError::Transaction(message)),
            Script::FailAfterHash(message) => {
                reporter.hash_observed(TxHash::random());
                reporter.failed(ChainError::Transaction(message));
            }
        }
        Ok(handle)
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> ChainResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ChainError::Gateway("scripted gateway lock poisoned".into()))
}

#[async_trait]
impl ChainGateway for ScriptedGateway {
    async fn transfer(&self, call: TransferCall) -> ChainResult<TxHandle> {
        self.submit(SubmittedCall::Transfer(call))
    }

    async fn multi_transfer(&self, call: MultiTransferCall) -> ChainResult<TxHandle> {
        self.submit(SubmittedCall::MultiTransfer(call))
    }

    async fn withdraw(&self, call: WithdrawCall) -> ChainResult<TxHandle> {
        self.submit(SubmittedCall::Withdraw(call))
    }
}
