//! Supply planning.
//!
//! Sizes the mint's supply to the eligible recipient population and mints
//! the shortfall into the administrator's account. Rerunning when supply
//! already covers the population is a no-op.

use crate::error::{Result, Stage, WorkflowError};
use ration_ledger::{Address, Amount, Authority, LedgerClient};
use ration_registry::Registry;
use serde::Serialize;
use tracing::{debug, info};

/// Result of a supply planning run. Counts are in whole tokens.
#[derive(Debug, Clone, Serialize)]
pub struct SupplyReport {
    /// Whole tokens minted by this run.
    pub minted: u64,
    /// Total supply after the run.
    pub total_supply: u64,
    /// Eligible recipient count the supply was sized to.
    pub eligible: u64,
}

/// Computes and mints the supply delta for a mint.
#[derive(Debug, Clone)]
pub struct SupplyPlanner {
    ledger: LedgerClient,
    registry: Registry,
}

impl SupplyPlanner {
    /// Create a planner over the given ledger and registry.
    #[must_use]
    pub fn new(ledger: LedgerClient, registry: Registry) -> Self {
        Self { ledger, registry }
    }

    /// Ensure supply covers the eligible population.
    ///
    /// Mints `max(0, eligible - current_supply)` whole tokens, scaled by
    /// the mint's decimals, into the administrator's receiving account
    /// (created first if absent). After minting, re-reads supply and
    /// verifies it matches; a mismatch is fatal and must not be blindly
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns `supply_verification` on a post-mint mismatch,
    /// `transient_ledger` on timeout, `configuration` for an unregistered
    /// mint.
    pub async fn ensure_supply(&self, mint: &Address, admin: &Authority) -> Result<SupplyReport> {
        let record = self
            .registry
            .mint(mint)
            .await
            .ok_or_else(|| WorkflowError::UnknownMint {
                mint: mint.to_string(),
            })?;

        let eligible = self.registry.count_eligible().await as u64;
        let scale = Amount::scale_factor(record.decimals)
            .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;
        let desired = eligible.checked_mul(scale).ok_or_else(|| {
            WorkflowError::ledger(
                Stage::Supply,
                ration_ledger::LedgerError::configuration(format!(
                    "{eligible} eligible recipients at {} decimals overflows supply",
                    record.decimals
                )),
            )
        })?;

        let current = self
            .ledger
            .get_supply(mint)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;

        if current >= desired {
            debug!(
                mint = %mint,
                current,
                eligible,
                "supply already covers eligible population"
            );
            return Ok(SupplyReport {
                minted: 0,
                total_supply: current / scale,
                eligible,
            });
        }

        let delta = desired - current;

        let admin_account = LedgerClient::derive_receiving_address(admin.address(), mint);
        let info = self
            .ledger
            .get_account_info(&admin_account)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;
        if info.is_none() {
            self.ledger
                .create_receiving_account(admin.address(), mint)
                .await
                .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;
        }

        self.ledger
            .mint_to(mint, &admin_account, Amount::from_base_units(delta))
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;

        let after = self
            .ledger
            .get_supply(mint)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Supply, e))?;
        if after != current + delta {
            return Err(WorkflowError::ledger(
                Stage::Supply,
                ration_ledger::LedgerError::SupplyVerification {
                    expected: current + delta,
                    actual: after,
                },
            ));
        }

        info!(
            mint = %mint,
            minted = delta / scale,
            total_supply = after / scale,
            eligible,
            "supply minted to cover eligible population"
        );
        Ok(SupplyReport {
            minted: delta / scale,
            total_supply: after / scale,
            eligible,
        })
    }
}
