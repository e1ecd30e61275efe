//! Delegation orchestrator for the Giveth donation ledger.
//!
//! `DonationService` drives each donation action through its transaction
//! lifecycle: submission, hash observed (the off-chain ledger is updated
//! optimistically at this point), and mined. Progress is reported to a
//! `DelegationObserver`; user-facing failures go to a `Notifier`.

pub mod config;
pub mod error;
pub mod notify;
pub mod observer;
pub mod plan;
pub mod service;

pub use config::{ConfigError, ConfigResult, DelegationConfig};
pub use error::{DelegationError, DelegationResult};
pub use notify::{CollectingNotifier, Notice, Notifier, Severity, TracingNotifier};
pub use observer::{DelegationObserver, NoOpObserver, ObserverEvent, RecordingObserver};
pub use plan::{DelegationAction, DelegationPlan};
pub use service::{is_benign_resubmission_error, DonationService, GiverAccount, TxOutcome};
