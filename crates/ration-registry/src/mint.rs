//! Mint pointer records.

use chrono::{DateTime, Utc};
use ration_ledger::Address;
use serde::{Deserialize, Serialize};

/// A mint known to the registry.
///
/// At most one record is active at a time; [`crate::Registry::activate`]
/// flips the pointer atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRecord {
    /// The mint account address.
    pub address: Address,
    /// Decimals the mint was created with. Single source of truth for
    /// minor-unit scaling across supply planning and distribution.
    pub decimals: u8,
    /// The mint authority's address.
    pub mint_authority: Address,
    /// Whether metadata has been attached. Set once, never unset.
    pub metadata_attached: bool,
    /// Whether this is the active mint.
    pub active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl MintRecord {
    /// Create a new, not-yet-active record.
    #[must_use]
    pub fn new(address: Address, decimals: u8, mint_authority: Address) -> Self {
        Self {
            address,
            decimals,
            mint_authority,
            metadata_attached: false,
            active: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_inactive_without_metadata() {
        let record = MintRecord::new(
            Address::from_array([1u8; 32]),
            2,
            Address::from_array([2u8; 32]),
        );
        assert!(!record.active);
        assert!(!record.metadata_attached);
        assert_eq!(record.decimals, 2);
    }
}
