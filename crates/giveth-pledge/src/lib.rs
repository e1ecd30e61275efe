//! Pledge allocation for the Giveth delegation engine.
//!
//! This crate provides:
//! - [`allocate`]: carve a target amount out of an oldest-first list of
//!   donation fragments, splitting at most one of them
//! - [`PledgeNote`]: the packed `amount ++ pledgeId` word passed to the
//!   multi-transfer contract call

pub mod allocation;
pub mod error;
pub mod note;

pub use allocation::{allocate, Allocation, ConsumedFragment, PledgeAmount, PledgeFragment};
pub use error::{PledgeError, PledgeResult};
pub use note::{PledgeNote, AMOUNT_HEX_DIGITS, PLEDGE_ID_HEX_DIGITS};
