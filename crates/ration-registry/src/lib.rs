//! # ration-registry
//!
//! Persisted recipient and mint-pointer state for the ration pipeline.
//!
//! This crate provides:
//! - The [`Recipient`] entity with its eligibility/fulfillment lifecycle
//! - Pre-transfer [`Reservation`] records that keep delivery at-most-once
//!   across crashes
//! - The [`MintRecord`] pointer with its single-active-mint invariant
//! - An async [`Registry`] store with stable ordered selection
//!
//! Recipients are registered by an external process; this crate only
//! mutates fulfillment fields and never deletes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod mint;
pub mod recipient;
pub mod store;

pub use error::{RegistryError, Result};
pub use mint::MintRecord;
pub use recipient::{Eligibility, Recipient, RecipientId, Reservation};
pub use store::Registry;
