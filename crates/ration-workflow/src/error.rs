//! Workflow-level errors.
//!
//! A fatal stage error carries the stage name, the classified error kind,
//! and a message. Recipient-level failures inside distribution never
//! surface here; they accumulate in the run result instead.

use ration_ledger::LedgerError;
use ration_registry::RegistryError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Mint creation and activation.
    Mint,
    /// Metadata attachment.
    Metadata,
    /// Supply planning.
    Supply,
    /// Distribution.
    Distribution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "mint"),
            Self::Metadata => write!(f, "metadata"),
            Self::Supply => write!(f, "supply"),
            Self::Distribution => write!(f, "distribution"),
        }
    }
}

/// Errors surfaced by pipeline stages.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// A ledger operation failed fatally for the stage.
    #[error("{stage} stage failed: {source}")]
    Ledger {
        /// The failing stage.
        stage: Stage,
        /// The classified ledger error.
        #[source]
        source: LedgerError,
    },

    /// A registry operation failed fatally for the stage.
    #[error("{stage} stage failed: {source}")]
    Registry {
        /// The failing stage.
        stage: Stage,
        /// The registry error.
        #[source]
        source: RegistryError,
    },

    /// No active mint is registered; run mint creation first.
    #[error("no active mint registered")]
    NoActiveMint,

    /// The given mint is not in the registry's pointer table.
    #[error("mint {mint} is not registered")]
    UnknownMint {
        /// The mint address.
        mint: String,
    },

    /// Another distribution run holds the per-mint run lock.
    #[error("a distribution run is already in progress for mint {mint}")]
    RunInProgress {
        /// The mint address.
        mint: String,
    },
}

impl WorkflowError {
    /// Wrap a ledger error with its stage.
    #[must_use]
    pub fn ledger(stage: Stage, source: LedgerError) -> Self {
        Self::Ledger { stage, source }
    }

    /// Wrap a registry error with its stage.
    #[must_use]
    pub fn registry(stage: Stage, source: RegistryError) -> Self {
        Self::Registry { stage, source }
    }

    /// Stable kind tag for envelopes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger { source, .. } => source.kind(),
            Self::Registry { source, .. } => match source {
                RegistryError::AlreadyFulfilled { .. } => "already_fulfilled",
                RegistryError::RecipientNotFound { .. } | RegistryError::MintNotFound { .. } => {
                    "registry"
                }
            },
            Self::NoActiveMint | Self::UnknownMint { .. } => "configuration",
            Self::RunInProgress { .. } => "run_in_progress",
        }
    }

    /// The originating stage, where one applies.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Ledger { stage, .. } | Self::Registry { stage, .. } => Some(*stage),
            Self::RunInProgress { .. } => Some(Stage::Distribution),
            Self::NoActiveMint | Self::UnknownMint { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_keep_their_kind() {
        let err = WorkflowError::ledger(Stage::Supply, LedgerError::transient("timed out"));
        assert_eq!(err.kind(), "transient_ledger");
        assert_eq!(err.stage(), Some(Stage::Supply));
        assert!(err.to_string().contains("supply"));
    }

    #[test]
    fn no_active_mint_is_configuration() {
        assert_eq!(WorkflowError::NoActiveMint.kind(), "configuration");
        assert_eq!(WorkflowError::NoActiveMint.stage(), None);
    }

    #[test]
    fn run_in_progress() {
        let err = WorkflowError::RunInProgress {
            mint: "abc".to_string(),
        };
        assert_eq!(err.kind(), "run_in_progress");
        assert_eq!(err.stage(), Some(Stage::Distribution));
    }
}
