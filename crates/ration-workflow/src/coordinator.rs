//! Mint creation and the active-mint pointer.

use crate::error::{Result, Stage, WorkflowError};
use ration_ledger::{Address, Authority, LedgerClient};
use ration_registry::{MintRecord, Registry};
use tracing::info;

/// Creates mints and manages the single active-mint pointer.
#[derive(Debug, Clone)]
pub struct MintCoordinator {
    ledger: LedgerClient,
    registry: Registry,
}

impl MintCoordinator {
    /// Create a coordinator over the given ledger and registry.
    #[must_use]
    pub fn new(ledger: LedgerClient, registry: Registry) -> Self {
        Self { ledger, registry }
    }

    /// Create a new mint and make it the active one.
    ///
    /// The pointer flip deactivates any prior active mint in the same
    /// registry transaction; there is no intermediate state with zero or
    /// two active mints.
    ///
    /// # Errors
    ///
    /// Returns a `configuration` error for malformed authority material or
    /// out-of-range decimals, `transient_ledger` on timeout.
    pub async fn create_mint(&self, authority: &Authority, decimals: u8) -> Result<Address> {
        let mint = self
            .ledger
            .create_mint(authority, decimals)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Mint, e))?;

        self.registry
            .activate(MintRecord::new(
                mint.clone(),
                decimals,
                authority.address().clone(),
            ))
            .await;

        info!(mint = %mint, decimals, "mint created and activated");
        Ok(mint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_mint_activates_pointer() {
        let ledger = LedgerClient::new();
        let registry = Registry::new();
        let coordinator = MintCoordinator::new(ledger, registry.clone());
        let authority = Authority::generate().expect("should generate");

        let mint = coordinator
            .create_mint(&authority, 2)
            .await
            .expect("should create");

        let active = registry.active_mint().await.expect("active mint");
        assert_eq!(active.address, mint);
        assert_eq!(active.decimals, 2);
        assert_eq!(active.mint_authority, *authority.address());
        assert!(!active.metadata_attached);
    }

    #[tokio::test]
    async fn second_mint_replaces_pointer() {
        let ledger = LedgerClient::new();
        let registry = Registry::new();
        let coordinator = MintCoordinator::new(ledger, registry.clone());
        let authority = Authority::generate().expect("should generate");

        let first = coordinator
            .create_mint(&authority, 2)
            .await
            .expect("first mint");
        let second = coordinator
            .create_mint(&authority, 2)
            .await
            .expect("second mint");

        let active = registry.active_mint().await.expect("active mint");
        assert_eq!(active.address, second);
        assert!(!registry.mint(&first).await.expect("record").active);
    }

    #[tokio::test]
    async fn bad_decimals_is_configuration_error() {
        let coordinator = MintCoordinator::new(LedgerClient::new(), Registry::new());
        let authority = Authority::generate().expect("should generate");

        let err = coordinator.create_mint(&authority, 200).await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert_eq!(err.stage(), Some(Stage::Mint));
    }
}
