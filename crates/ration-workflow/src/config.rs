//! Workflow configuration.

use std::time::Duration;

/// Tunables for the pipeline.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Decimals newly created mints are configured with.
    pub decimals: u8,
    /// Attempt bound for metadata submission retries.
    pub metadata_max_attempts: u32,
    /// Worker pool size for distribution.
    pub parallelism: usize,
    /// Per-call timeout applied to every ledger operation.
    pub ledger_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            metadata_max_attempts: 3,
            parallelism: 4,
            ledger_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkflowConfig {
    /// Set the decimals for new mints.
    #[must_use]
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Set the metadata retry attempt bound. Clamped to at least one.
    #[must_use]
    pub fn with_metadata_max_attempts(mut self, attempts: u32) -> Self {
        self.metadata_max_attempts = attempts.max(1);
        self
    }

    /// Set the distribution worker pool size. Clamped to at least one.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the per-call ledger timeout.
    #[must_use]
    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }
}
