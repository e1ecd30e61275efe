//! Donation ledger projection for the Giveth delegation engine.
//!
//! The ledger is an off-chain, queryable mirror of on-chain pledge state.
//! This crate provides:
//! - The `DonationStore` trait boundary (query, get, patch, create)
//! - `InMemoryDonationStore` for tests, simulations, and embedding
//! - `LedgerReconciler`: optimistic ledger writes at the hash-observed checkpoint
//! - Audit projections over the `parentDonations` history
//! - Loading of delegable donations under a distinct-pledge limit

pub mod error;
pub mod loader;
pub mod memory;
pub mod patch;
pub mod projection;
pub mod query;
pub mod reconciler;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use loader::{delegation_budget, load_delegable, DelegableDonations, DelegationBudget, DelegationSource};
pub use memory::InMemoryDonationStore;
pub use patch::DonationPatch;
pub use projection::{LineageEntry, LineageProjection, OwnerSummary, ProjectionBuilder};
pub use query::{DonationQuery, Page, SortOrder};
pub use reconciler::{LedgerReconciler, Successor};
pub use traits::DonationStore;
