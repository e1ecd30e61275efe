//! Chain gateway boundary for the Giveth delegation engine.
//!
//! Transfers are submitted through `ChainGateway`. Each submission yields a
//! `TxHandle` exposing two checkpoints: the transaction hash becoming known,
//! and the transaction being mined (or failing).

pub mod calls;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod scripted;

pub use calls::{Contract, MultiTransferCall, SubmittedCall, TransferCall, WithdrawCall};
pub use error::{ChainError, ChainResult};
pub use gateway::ChainGateway;
pub use handle::{TxHandle, TxReceipt, TxReporter};
pub use scripted::{Script, ScriptedGateway};
