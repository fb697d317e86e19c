//! Metadata attachment.
//!
//! Attachment is a one-time operation per mint. The metadata account
//! address is derived locally; a single account-info lookup decides
//! whether the mint already carries metadata before anything is submitted.

use crate::error::{Result, Stage, WorkflowError};
use ration_ledger::{
    derive_metadata_address, Address, LedgerClient, MetadataPayload, Signature, TokenMetadata,
    METADATA_PROGRAM_ID,
};
use ration_registry::Registry;
use tracing::{info, warn};

/// Attaches name/symbol/URI metadata to a mint, exactly once.
#[derive(Debug, Clone)]
pub struct MetadataAttacher {
    ledger: LedgerClient,
    registry: Registry,
    max_attempts: u32,
}

impl MetadataAttacher {
    /// Create an attacher with the given submission attempt bound.
    #[must_use]
    pub fn new(ledger: LedgerClient, registry: Registry, max_attempts: u32) -> Self {
        Self {
            ledger,
            registry,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attach metadata to `mint`.
    ///
    /// Transient submission failures are retried with a freshly fetched
    /// nonce up to the attempt bound. On success the mint record's
    /// `metadata_attached` flag is set.
    ///
    /// # Errors
    ///
    /// Returns `already_attached` if the derived metadata account holds
    /// data, `transient_ledger` once retries are exhausted.
    pub async fn attach(&self, mint: &Address, metadata: TokenMetadata) -> Result<Signature> {
        let record = self
            .registry
            .mint(mint)
            .await
            .ok_or_else(|| WorkflowError::UnknownMint {
                mint: mint.to_string(),
            })?;

        let metadata_account = derive_metadata_address(METADATA_PROGRAM_ID, mint);
        let existing = self
            .ledger
            .get_account_info(&metadata_account)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Metadata, e))?;
        if existing.is_some() {
            return Err(WorkflowError::ledger(
                Stage::Metadata,
                ration_ledger::LedgerError::AlreadyAttached {
                    mint: mint.to_string(),
                },
            ));
        }

        let payload = MetadataPayload::for_mint_authority(metadata, record.mint_authority);

        let mut attempt = 1;
        loop {
            // The nonce fetch sits inside the loop so its transient
            // failures share the submission's retry budget.
            let result = match self.ledger.latest_nonce().await {
                Ok(nonce) => self.ledger.submit_metadata(mint, payload.clone(), nonce).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(signature) => {
                    self.registry
                        .set_metadata_attached(mint)
                        .await
                        .map_err(|e| WorkflowError::registry(Stage::Metadata, e))?;
                    info!(mint = %mint, account = %metadata_account, %signature, "metadata attached");
                    return Ok(signature);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        mint = %mint,
                        attempt,
                        error = %e,
                        "metadata submission failed, retrying with fresh nonce"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(WorkflowError::ledger(Stage::Metadata, e)),
            }
        }
    }
}
