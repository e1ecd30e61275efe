use giveth_types::TxHash;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{ChainError, ChainResult};

/// A mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Caller side of a submitted transaction.
///
/// The hash checkpoint fires at most once. If the transaction fails before
/// a hash is known, [`TxHandle::hash_observed`] yields `None` and the
/// failure is reported through [`TxHandle::confirmation`].
#[derive(Debug)]
pub struct TxHandle {
    hash_rx: Option<oneshot::Receiver<TxHash>>,
    observed: Option<TxHash>,
    confirmation_rx: oneshot::Receiver<ChainResult<TxReceipt>>,
}

/// Gateway side of a submitted transaction.
#[derive(Debug)]
pub struct TxReporter {
    hash_tx: Option<oneshot::Sender<TxHash>>,
    confirmation_tx: oneshot::Sender<ChainResult<TxReceipt>>,
}

impl TxHandle {
    pub fn channel() -> (TxReporter, TxHandle) {
        let (hash_tx, hash_rx) = oneshot::channel();
        let (confirmation_tx, confirmation_rx) = oneshot::channel();
        (
            TxReporter {
                hash_tx: Some(hash_tx),
                confirmation_tx,
            },
            TxHandle {
                hash_rx: Some(hash_rx),
                observed: None,
                confirmation_rx,
            },
        )
    }

    /// Wait for the transaction hash. Later calls return the same value.
    pub async fn hash_observed(&mut self) -> Option<TxHash> {
        if let Some(rx) = self.hash_rx.take() {
            self.observed = rx.await.ok();
        }
        self.observed.clone()
    }

    /// Wait for the transaction to be mined or to fail.
    pub async fn confirmation(self) -> ChainResult<TxReceipt> {
        self.confirmation_rx
            .await
            .map_err(|_| ChainError::HandleClosed("confirmation"))?
    }
}

impl TxReporter {
    /// Report the transaction hash. Only the first report is delivered.
    pub fn hash_observed(&mut self, hash: TxHash) {
        if let Some(tx) = self.hash_tx.take() {
            let _ = tx.send(hash);
        }
    }

    pub fn mined(self, receipt: TxReceipt) {
        let _ = self.confirmation_tx.send(Ok(receipt));
    }

    /// Report a failure. The hash checkpoint closes if it had not fired.
    pub fn failed(self, error: ChainError) {
        let _ = self.confirmation_tx.send(Err(error));
    }
}
