//! # ration-ledger
//!
//! Ledger primitives and the ledger adapter for the ration token
//! distribution pipeline.
//!
//! This crate provides:
//! - Addresses and signing authorities (Ed25519, base58-encoded)
//! - Token amounts in minor units with explicit decimal scaling
//! - Token metadata validation and deterministic metadata-address derivation
//! - A ledger client with a simulated in-memory backend
//! - The error taxonomy, classified once at the adapter boundary
//!
//! ## Example
//!
//! ```rust,no_run
//! use ration_ledger::{Amount, Authority, LedgerClient};
//!
//! # async fn example() -> ration_ledger::Result<()> {
//! let ledger = LedgerClient::new();
//! let authority = Authority::generate()?;
//!
//! // Create a mint with two decimal places.
//! let mint = ledger.create_mint(&authority, 2).await?;
//! println!("mint: {mint}");
//!
//! // Supply starts at zero.
//! let supply = ledger.get_supply(&mint).await?;
//! assert_eq!(supply, 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod client;
pub mod error;
pub mod metadata;
pub mod wallet;

pub use amount::Amount;
pub use client::{AccountInfo, Fault, LedgerClient, LedgerOp, Signature, TransferRecord};
pub use error::{LedgerError, Result};
pub use metadata::{
    derive_metadata_address, Creator, MetadataPayload, TokenMetadata, MAX_NAME_LEN, MAX_SYMBOL_LEN,
};
pub use wallet::{Address, Authority};

/// Program identifier used to derive metadata account addresses.
pub const METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Highest decimals value a mint may be configured with.
///
/// Caps the minor-unit scale factor at 10^12 so amount arithmetic stays
/// comfortably inside `u64` for realistic recipient populations.
pub const MAX_DECIMALS: u8 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_program_id_is_base58() {
        assert!(bs58::decode(METADATA_PROGRAM_ID).into_vec().is_ok());
    }

    #[test]
    fn max_decimals_scale_fits_u64() {
        assert!(10u64.checked_pow(u32::from(MAX_DECIMALS)).is_some());
    }
}
