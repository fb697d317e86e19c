//! Token metadata: validation, payload construction, address derivation.
//!
//! The metadata account address is derived deterministically from the
//! metadata program identifier and the mint address. Computing it needs no
//! network round trip; only checking whether it already holds data does.

use crate::error::{LedgerError, Result};
use crate::wallet::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum metadata name length.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum metadata symbol length.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Descriptive metadata for a token mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable token name, at most 32 characters.
    pub name: String,
    /// Ticker symbol, at most 10 characters.
    pub symbol: String,
    /// URI pointing at the off-ledger metadata document.
    pub uri: String,
}

impl TokenMetadata {
    /// Build validated metadata.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if a field is empty or
    /// exceeds its length limit.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.into();
        let uri = uri.into();

        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(LedgerError::configuration(format!(
                "metadata name must be 1-{MAX_NAME_LEN} characters, got {}",
                name.chars().count()
            )));
        }
        if symbol.is_empty() || symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(LedgerError::configuration(format!(
                "metadata symbol must be 1-{MAX_SYMBOL_LEN} characters, got {}",
                symbol.chars().count()
            )));
        }
        if uri.is_empty() {
            return Err(LedgerError::configuration("metadata uri must not be empty"));
        }

        Ok(Self { name, symbol, uri })
    }
}

/// A creator entry in the metadata payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Creator address.
    pub address: Address,
    /// Whether the creator signed off on the metadata.
    pub verified: bool,
    /// Royalty share percentage.
    pub share: u8,
}

/// The full payload submitted to the metadata program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPayload {
    /// The descriptive fields.
    pub metadata: TokenMetadata,
    /// Secondary-sale fee in basis points. Always zero for this token.
    pub seller_fee_basis_points: u16,
    /// Creator list. Always a single verified creator: the mint authority.
    pub creators: Vec<Creator>,
    /// Whether the metadata account may be updated later.
    pub is_mutable: bool,
}

impl MetadataPayload {
    /// Build the payload for a mint whose sole creator is its authority.
    #[must_use]
    pub fn for_mint_authority(metadata: TokenMetadata, authority: Address) -> Self {
        Self {
            metadata,
            seller_fee_basis_points: 0,
            creators: vec![Creator {
                address: authority,
                verified: true,
                share: 100,
            }],
            is_mutable: true,
        }
    }
}

/// Derive the metadata account address for a mint.
///
/// Pure function: SHA-256 over the fixed seed `"metadata"`, the program
/// identifier, and the mint address bytes.
#[must_use]
pub fn derive_metadata_address(program_id: &str, mint: &Address) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"metadata");
    hasher.update(program_id.as_bytes());
    hasher.update(mint.to_bytes());
    Address::from_array(hasher.finalize().into())
}
