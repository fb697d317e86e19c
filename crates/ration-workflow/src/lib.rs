//! Token issuance and distribution pipeline.
//!
//! Four stages run against one ledger and one recipient registry:
//!
//! 1. [`MintCoordinator`] creates a mint and flips the active-mint pointer.
//! 2. [`MetadataAttacher`] attaches name/symbol/URI metadata, exactly once.
//! 3. [`SupplyPlanner`] sizes the supply to the eligible population and
//!    mints the shortfall into the administrator's account.
//! 4. [`DistributionEngine`] delivers exactly one unit to each eligible,
//!    unfulfilled recipient, at most once per recipient across reruns.
//!
//! Every stage is independently rerunnable: completed work is detected and
//! skipped, so recovery from a partial failure is "run it again". Stage
//! entry points report through JSON [`Envelope`]s for operator tooling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod distribute;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod supply;
pub mod workflow;

pub use config::WorkflowConfig;
pub use coordinator::MintCoordinator;
pub use distribute::{
    CancelFlag, DistributionEngine, DistributionRunResult, Outcome, RecipientOutcome, RunLock,
};
pub use envelope::{Envelope, ErrorBody};
pub use error::{Result, Stage, WorkflowError};
pub use metadata::MetadataAttacher;
pub use supply::{SupplyPlanner, SupplyReport};
pub use workflow::{TokenWorkflow, WorkflowSummary};
