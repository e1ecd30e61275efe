//! Foundation types for the Giveth donation delegation engine.
//!
//! Every other workspace crate depends on `giveth-types`.
//!
//! # Key Types
//!
//! - [`Amount`]: Arbitrary-precision token amount in minor units (wei)
//! - [`Donation`]: Off-chain ledger record for a fragment of pledged value
//! - [`DonationStatus`]: Lifecycle state of a donation record
//! - [`EntityKind`] / [`TargetKind`]: Closed sets of entity types
//! - [`DelegateTarget`]: Entity receiving a delegation
//! - [`Address`], [`TxHash`], [`DonationId`], [`PledgeId`]: Identifiers

pub mod amount;
pub mod donation;
pub mod entity;
pub mod error;
pub mod ids;

pub use amount::Amount;
pub use donation::{Donation, DonationStatus, NewDonation};
pub use entity::{DelegateTarget, EntityAccount, EntityKind, Party, TargetKind};
pub use error::TypeError;
pub use ids::{Address, AdminId, DonationId, PledgeId, ProjectId, TxHash};
