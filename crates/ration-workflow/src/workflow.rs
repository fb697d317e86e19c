//! The assembled pipeline.
//!
//! `TokenWorkflow` wires the four stages over one ledger client and one
//! registry. Stages can be invoked individually against the active mint,
//! or end to end via [`TokenWorkflow::run`].

use crate::config::WorkflowConfig;
use crate::coordinator::MintCoordinator;
use crate::distribute::{CancelFlag, DistributionEngine, DistributionRunResult};
use crate::error::{Result, WorkflowError};
use crate::metadata::MetadataAttacher;
use crate::supply::{SupplyPlanner, SupplyReport};
use ration_ledger::{Address, Authority, LedgerClient, Signature, TokenMetadata};
use ration_registry::Registry;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Summary of one end-to-end pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    /// The mint the run created and activated.
    pub mint: String,
    /// Signature of the metadata attachment.
    pub metadata_signature: String,
    /// Supply planning outcome.
    pub supply: SupplyReport,
    /// Distribution outcome.
    pub distribution: DistributionRunResult,
}

/// The four-stage issuance pipeline over one ledger and one registry.
#[derive(Debug, Clone)]
pub struct TokenWorkflow {
    registry: Registry,
    admin: Arc<Authority>,
    config: WorkflowConfig,
    coordinator: MintCoordinator,
    attacher: MetadataAttacher,
    planner: SupplyPlanner,
    engine: DistributionEngine,
}

impl TokenWorkflow {
    /// Assemble the pipeline. The administrator authority signs mint
    /// creation and funds every distribution transfer.
    #[must_use]
    pub fn new(
        ledger: LedgerClient,
        registry: Registry,
        admin: Authority,
        config: WorkflowConfig,
    ) -> Self {
        let ledger = ledger.with_timeout(config.ledger_timeout);
        let admin = Arc::new(admin);
        let coordinator = MintCoordinator::new(ledger.clone(), registry.clone());
        let attacher = MetadataAttacher::new(
            ledger.clone(),
            registry.clone(),
            config.metadata_max_attempts,
        );
        let planner = SupplyPlanner::new(ledger.clone(), registry.clone());
        let engine = DistributionEngine::new(
            ledger,
            registry.clone(),
            Arc::clone(&admin),
            config.parallelism,
        );
        Self {
            registry,
            admin,
            config,
            coordinator,
            attacher,
            planner,
            engine,
        }
    }

    /// The recipient registry this pipeline operates over.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Create a new mint and make it the active one.
    ///
    /// # Errors
    ///
    /// See [`MintCoordinator::create_mint`].
    pub async fn create_mint(&self) -> Result<Address> {
        self.coordinator
            .create_mint(&self.admin, self.config.decimals)
            .await
    }

    /// Attach metadata to the active mint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoActiveMint`] when no mint is active;
    /// otherwise see [`MetadataAttacher::attach`].
    pub async fn attach_metadata(&self, metadata: TokenMetadata) -> Result<Signature> {
        let mint = self.active_mint().await?;
        self.attacher.attach(&mint, metadata).await
    }

    /// Size the active mint's supply to the eligible population.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoActiveMint`] when no mint is active;
    /// otherwise see [`SupplyPlanner::ensure_supply`].
    pub async fn ensure_supply(&self) -> Result<SupplyReport> {
        let mint = self.active_mint().await?;
        self.planner.ensure_supply(&mint, &self.admin).await
    }

    /// Distribute one unit to each eligible, unfulfilled recipient of the
    /// active mint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoActiveMint`] when no mint is active;
    /// otherwise see [`DistributionEngine::distribute`].
    pub async fn distribute(&self) -> Result<DistributionRunResult> {
        let mint = self.active_mint().await?;
        self.engine.distribute(&mint).await
    }

    /// Distribution with an external cancellation handle.
    ///
    /// # Errors
    ///
    /// See [`TokenWorkflow::distribute`].
    pub async fn distribute_with_cancel(
        &self,
        cancel: CancelFlag,
    ) -> Result<DistributionRunResult> {
        let mint = self.active_mint().await?;
        self.engine.distribute_with_cancel(&mint, cancel).await
    }

    /// Run all four stages in order against a fresh mint.
    ///
    /// # Errors
    ///
    /// Returns the first stage's fatal error; per-recipient failures land
    /// in the summary's distribution result instead.
    pub async fn run(&self, metadata: TokenMetadata) -> Result<WorkflowSummary> {
        let mint = self.create_mint().await?;
        let metadata_signature = self.attacher.attach(&mint, metadata).await?;
        let supply = self.planner.ensure_supply(&mint, &self.admin).await?;
        let distribution = self.engine.distribute(&mint).await?;

        info!(
            mint = %mint,
            minted = supply.minted,
            fulfilled = distribution.succeeded,
            "pipeline run complete"
        );
        Ok(WorkflowSummary {
            mint: mint.to_string(),
            metadata_signature: metadata_signature.to_string(),
            supply,
            distribution,
        })
    }

    async fn active_mint(&self) -> Result<Address> {
        self.registry
            .active_mint()
            .await
            .map(|record| record.address)
            .ok_or(WorkflowError::NoActiveMint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ration_registry::{Eligibility, Recipient, RecipientId};

    fn workflow() -> TokenWorkflow {
        let admin = Authority::generate().expect("should generate");
        TokenWorkflow::new(
            LedgerClient::new(),
            Registry::new(),
            admin,
            WorkflowConfig::default(),
        )
    }

    fn metadata() -> TokenMetadata {
        TokenMetadata::new("Ration Token", "RATION", "https://example.org/meta").expect("valid")
    }

    async fn register_eligible(workflow: &TokenWorkflow, count: usize) {
        for i in 0..count {
            let wallet = Authority::generate()
                .expect("should generate")
                .address()
                .as_str()
                .to_string();
            workflow
                .registry()
                .upsert(Recipient::with_id(
                    RecipientId::from_string(format!("r{i:02}")),
                    wallet,
                    Eligibility::Eligible,
                ))
                .await;
        }
    }

    #[tokio::test]
    async fn stages_require_an_active_mint() {
        let workflow = workflow();

        let err = workflow.attach_metadata(metadata()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoActiveMint));
        assert!(matches!(
            workflow.ensure_supply().await.unwrap_err(),
            WorkflowError::NoActiveMint
        ));
        assert!(matches!(
            workflow.distribute().await.unwrap_err(),
            WorkflowError::NoActiveMint
        ));
    }

    #[tokio::test]
    async fn end_to_end_run_fulfills_everyone() {
        let workflow = workflow();
        register_eligible(&workflow, 3).await;

        let summary = workflow.run(metadata()).await.expect("pipeline run");
        assert_eq!(summary.supply.minted, 3);
        assert_eq!(summary.distribution.attempted, 3);
        assert_eq!(summary.distribution.succeeded, 3);
        assert_eq!(summary.distribution.failed, 0);
        assert_eq!(workflow.registry().count_fulfilled().await, 3);
    }

    #[tokio::test]
    async fn stage_by_stage_matches_end_to_end() {
        let workflow = workflow();
        register_eligible(&workflow, 2).await;

        workflow.create_mint().await.expect("mint");
        workflow.attach_metadata(metadata()).await.expect("metadata");
        let supply = workflow.ensure_supply().await.expect("supply");
        assert_eq!(supply.minted, 2);

        let result = workflow.distribute().await.expect("distribution");
        assert_eq!(result.succeeded, 2);
    }

    #[tokio::test]
    async fn second_run_creates_a_fresh_campaign() {
        let workflow = workflow();
        register_eligible(&workflow, 1).await;

        let first = workflow.run(metadata()).await.expect("first run");
        let second = workflow.run(metadata()).await.expect("second run");

        // A new mint each time; recipients fulfilled in the first campaign
        // stay fulfilled, so the second run delivers nothing.
        assert_ne!(first.mint, second.mint);
        assert_eq!(second.distribution.attempted, 0);
        assert_eq!(second.distribution.skipped, 1);
    }
}
