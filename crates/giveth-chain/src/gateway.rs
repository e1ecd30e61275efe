use std::sync::Arc;

use async_trait::async_trait;

use crate::calls::{MultiTransferCall, TransferCall, WithdrawCall};
use crate::error::ChainResult;
use crate::handle::TxHandle;

/// Submits liquid-pledging calls to a chain.
///
/// An `Err` means the call was refused before a transaction existed.
/// Everything after that is reported through the returned handle.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn transfer(&self, call: TransferCall) -> ChainResult<TxHandle>;

    async fn multi_transfer(&self, call: MultiTransferCall) -> ChainResult<TxHandle>;

    async fn withdraw(&self, call: WithdrawCall) -> ChainResult<TxHandle>;
}

#[async_trait]
impl<G: ChainGateway + ?Sized> ChainGateway for Arc<G> {
    async fn transfer(&self, call: TransferCall) -> ChainResult<TxHandle> {
        (**self).transfer(call).await
    }

    async fn multi_transfer(&self, call: MultiTransferCall) -> ChainResult<TxHandle> {
        (**self).multi_transfer(call).await
    }

    async fn withdraw(&self, call: WithdrawCall) -> ChainResult<TxHandle> {
        (**self).withdraw(call).await
    }
}
