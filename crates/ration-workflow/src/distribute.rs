//! Distribution: one unit to each eligible, unfulfilled recipient.
//!
//! The selection snapshot is read once at run start and visited in
//! ascending id order. Each recipient is processed as an independent task
//! on a bounded worker pool; one recipient's failure never aborts the run.
//! The shared administrator balance is guarded by an optimistic reserved
//! counter, and a reservation record is persisted before every transfer so
//! an interrupted run can be reconciled against the ledger's transfer
//! history instead of paying a recipient twice.

use crate::error::{Result, Stage, WorkflowError};
use ration_ledger::{Address, Amount, Authority, LedgerClient, LedgerError, Signature};
use ration_registry::{Recipient, RecipientId, Registry, RegistryError, Reservation};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

/// What happened to one recipient during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The recipient received their unit and the record was persisted.
    Fulfilled {
        /// Signature of the fulfilling transfer.
        signature: Signature,
    },
    /// No transfer was needed or allowed; nothing changed on the ledger.
    Skipped {
        /// Why the recipient was skipped.
        reason: String,
    },
    /// The recipient could not be fulfilled this run.
    Failed {
        /// Classified error kind.
        kind: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// A recipient id paired with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    /// The recipient.
    pub id: RecipientId,
    /// What happened.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate result of one distribution run.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionRunResult {
    /// Unique id of this run.
    pub run_id: String,
    /// Recipients selected by the snapshot.
    pub attempted: usize,
    /// Recipients fulfilled by this run.
    pub succeeded: usize,
    /// Recipients skipped: already fulfilled at selection, fulfilled
    /// after the snapshot, reconciled from an earlier run, or cancelled.
    pub skipped: usize,
    /// Recipients that failed this run.
    pub failed: usize,
    /// Per-recipient outcomes, in ascending id order.
    pub per_recipient: Vec<RecipientOutcome>,
}

/// Run-level cancellation signal.
///
/// Cancelling only prevents *starting* new recipient operations; a
/// transfer already submitted to the ledger cannot be revoked.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a fresh, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

/// Per-mint run lock.
///
/// Distribution runs against the same mint must not overlap; an
/// overlapping run fails fast with `run_in_progress` instead of racing
/// the administrator balance.
#[derive(Debug, Clone, Default)]
pub struct RunLock {
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunLock {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the lock for a mint. Returns `None` if a run
    /// already holds it. The lock releases when the guard drops.
    #[must_use]
    pub fn try_acquire(&self, mint: &Address) -> Option<RunGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.insert(mint.as_str().to_string()) {
            Some(RunGuard {
                mint: mint.as_str().to_string(),
                active: Arc::clone(&self.active),
            })
        } else {
            None
        }
    }
}

/// Guard holding a per-mint run lock.
#[derive(Debug)]
pub struct RunGuard {
    mint: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.remove(&self.mint);
    }
}

/// Everything a per-recipient task needs, cloned per dispatch.
#[derive(Clone)]
struct TaskContext {
    ledger: LedgerClient,
    registry: Registry,
    admin_account: Address,
    mint: Address,
    one: Amount,
    run_id: String,
    spendable: Arc<AtomicU64>,
    cancel: CancelFlag,
}

/// Delivers one unit to each eligible, unfulfilled recipient.
#[derive(Clone)]
pub struct DistributionEngine {
    ledger: LedgerClient,
    registry: Registry,
    admin: Arc<Authority>,
    parallelism: usize,
    run_lock: RunLock,
}

impl DistributionEngine {
    /// Create an engine funding transfers from `admin`'s account.
    #[must_use]
    pub fn new(
        ledger: LedgerClient,
        registry: Registry,
        admin: Arc<Authority>,
        parallelism: usize,
    ) -> Self {
        Self {
            ledger,
            registry,
            admin,
            parallelism: parallelism.max(1),
            run_lock: RunLock::new(),
        }
    }

    /// Run a distribution over the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `run_in_progress` if another run holds the mint's lock,
    /// `configuration` for an unregistered mint, `transient_ledger` if
    /// the administrator balance cannot be read. Per-recipient failures
    /// never surface here; they land in the result.
    pub async fn distribute(&self, mint: &Address) -> Result<DistributionRunResult> {
        self.distribute_with_cancel(mint, CancelFlag::new()).await
    }

    /// Run a distribution that can be cancelled mid-run.
    ///
    /// Cancellation stops new recipient operations from starting; work
    /// already dispatched runs to completion.
    ///
    /// # Errors
    ///
    /// See [`DistributionEngine::distribute`].
    pub async fn distribute_with_cancel(
        &self,
        mint: &Address,
        cancel: CancelFlag,
    ) -> Result<DistributionRunResult> {
        let record = self
            .registry
            .mint(mint)
            .await
            .ok_or_else(|| WorkflowError::UnknownMint {
                mint: mint.to_string(),
            })?;
        let _guard = self
            .run_lock
            .try_acquire(mint)
            .ok_or_else(|| WorkflowError::RunInProgress {
                mint: mint.to_string(),
            })?;

        let run_id = Uuid::new_v4().to_string();
        let one = Amount::one(record.decimals)
            .map_err(|e| WorkflowError::ledger(Stage::Distribution, e))?;

        // Selection snapshot, read once, ascending id order.
        let snapshot = self.registry.eligible_unfulfilled().await;
        let skipped_at_selection = self.registry.fulfilled_ids().await;
        let attempted = snapshot.len();

        let admin_account = LedgerClient::derive_receiving_address(self.admin.address(), mint);
        let available = self
            .ledger
            .get_balance(&admin_account)
            .await
            .map_err(|e| WorkflowError::ledger(Stage::Distribution, e))?;

        info!(
            run = %run_id,
            mint = %mint,
            attempted,
            available,
            "distribution run starting"
        );

        let spendable = Arc::new(AtomicU64::new(available));
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut handles = Vec::with_capacity(attempted);

        for recipient in snapshot {
            let ctx = TaskContext {
                ledger: self.ledger.clone(),
                registry: self.registry.clone(),
                admin_account: admin_account.clone(),
                mint: mint.clone(),
                one,
                run_id: run_id.clone(),
                spendable: Arc::clone(&spendable),
                cancel: cancel.clone(),
            };
            let semaphore = Arc::clone(&semaphore);
            let id = recipient.id.clone();

            handles.push((
                id,
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return Outcome::Failed {
                                kind: "internal".to_string(),
                                reason: "worker pool closed".to_string(),
                            }
                        }
                    };
                    if ctx.cancel.is_cancelled() {
                        return Outcome::Skipped {
                            reason: "run cancelled before dispatch".to_string(),
                        };
                    }
                    process_recipient(ctx, recipient).await
                }),
            ));
        }

        let mut per_recipient = Vec::with_capacity(attempted + skipped_at_selection.len());
        for id in skipped_at_selection {
            per_recipient.push(RecipientOutcome {
                id,
                outcome: Outcome::Skipped {
                    reason: "already fulfilled at selection".to_string(),
                },
            });
        }
        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed {
                    kind: "internal".to_string(),
                    reason: format!("worker task failed: {e}"),
                },
            };
            per_recipient.push(RecipientOutcome { id, outcome });
        }
        per_recipient.sort_by(|a, b| a.id.cmp(&b.id));

        let succeeded = per_recipient
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Fulfilled { .. }))
            .count();
        let skipped = per_recipient
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Skipped { .. }))
            .count();
        let failed = per_recipient
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
            .count();

        info!(
            run = %run_id,
            attempted,
            succeeded,
            skipped,
            failed,
            "distribution run complete"
        );
        Ok(DistributionRunResult {
            run_id,
            attempted,
            succeeded,
            skipped,
            failed,
            per_recipient,
        })
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for DistributionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionEngine")
            .field("admin", self.admin.address())
            .field("parallelism", &self.parallelism)
            .finish_non_exhaustive()
    }
}

/// Process one recipient in isolation. Never panics, never aborts the run.
async fn process_recipient(ctx: TaskContext, recipient: Recipient) -> Outcome {
    let id = recipient.id.clone();

    // Wallet well-formedness gates everything else.
    let owner = match Address::from_base58(&recipient.wallet_address) {
        Ok(address) => address,
        Err(e) => {
            warn!(recipient = %id, error = %e, "recipient wallet is malformed");
            return Outcome::Failed {
                kind: e.kind().to_string(),
                reason: e.to_string(),
            };
        }
    };

    // A dangling reservation means an earlier run may have paid this
    // recipient without completing the record. Reconcile against the
    // ledger's transfer history before considering a new transfer.
    if let Some(reservation) = recipient.reservation.clone() {
        match reconcile_reservation(&ctx, &id, &reservation).await {
            Ok(Some(outcome)) => return outcome,
            Ok(None) => {}
            Err(e) => {
                return Outcome::Failed {
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    // Create-if-absent receiving account.
    let receiving = LedgerClient::derive_receiving_address(&owner, &ctx.mint);
    match ctx.ledger.get_account_info(&receiving).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Err(e) = ctx.ledger.create_receiving_account(&owner, &ctx.mint).await {
                return Outcome::Failed {
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                };
            }
        }
        Err(e) => {
            return Outcome::Failed {
                kind: e.kind().to_string(),
                reason: e.to_string(),
            }
        }
    }

    // Mandatory re-check: a concurrent run may have fulfilled this
    // recipient after the selection snapshot was taken.
    match ctx.registry.is_fulfilled(&id).await {
        Ok(true) => {
            return Outcome::Skipped {
                reason: "fulfilled after selection".to_string(),
            }
        }
        Ok(false) => {}
        Err(e) => {
            return Outcome::Failed {
                kind: "registry".to_string(),
                reason: e.to_string(),
            }
        }
    }

    // Optimistically reserve one unit of the administrator balance. A
    // failed reservation also cancels the run: recipients not yet
    // dispatched cannot be funded either.
    if !try_reserve(&ctx.spendable, ctx.one.base_units()) {
        ctx.cancel.cancel();
        let have = ctx.spendable.load(Ordering::Acquire);
        let e = LedgerError::InsufficientFunds {
            have,
            need: ctx.one.base_units(),
        };
        warn!(recipient = %id, "administrator balance exhausted, halting remaining transfers");
        return Outcome::Failed {
            kind: e.kind().to_string(),
            reason: e.to_string(),
        };
    }

    // The reservation is persisted before the transfer so an interrupted
    // run leaves a trail the next run can reconcile.
    if let Err(e) = ctx
        .registry
        .reserve(&id, &ctx.run_id, receiving.clone())
        .await
    {
        release(&ctx.spendable, ctx.one.base_units());
        return match e {
            RegistryError::AlreadyFulfilled { .. } => Outcome::Skipped {
                reason: "fulfilled after selection".to_string(),
            },
            other => Outcome::Failed {
                kind: "registry".to_string(),
                reason: other.to_string(),
            },
        };
    }

    match ctx
        .ledger
        .transfer(&ctx.admin_account, &receiving, ctx.one)
        .await
    {
        Ok(signature) => {
            match ctx
                .registry
                .complete_fulfillment(&id, receiving, signature.clone())
                .await
            {
                Ok(_) => {
                    info!(recipient = %id, %signature, "recipient fulfilled");
                    Outcome::Fulfilled { signature }
                }
                // The transfer landed but the record is incomplete. The
                // reservation stays in place; the next run reconciles it.
                Err(e) => Outcome::Failed {
                    kind: "registry".to_string(),
                    reason: e.to_string(),
                },
            }
        }
        Err(e) => {
            release(&ctx.spendable, ctx.one.base_units());
            let _ = ctx.registry.clear_reservation(&id).await;
            warn!(recipient = %id, error = %e, "transfer failed");
            Outcome::Failed {
                kind: e.kind().to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Decide what a dangling reservation means. Returns a final outcome when
/// the recipient needs no new transfer, `None` when the earlier run never
/// paid and delivery should proceed.
async fn reconcile_reservation(
    ctx: &TaskContext,
    id: &RecipientId,
    reservation: &Reservation,
) -> ration_ledger::Result<Option<Outcome>> {
    let transfers = ctx.ledger.transfers_to(&reservation.receiving_account).await?;
    let Some(prior) = transfers.iter().find(|t| t.source == ctx.admin_account) else {
        // The earlier run reserved but never transferred.
        let _ = ctx.registry.clear_reservation(id).await;
        return Ok(None);
    };

    match ctx
        .registry
        .complete_fulfillment(
            id,
            reservation.receiving_account.clone(),
            prior.signature.clone(),
        )
        .await
    {
        Ok(_) => {
            info!(
                recipient = %id,
                signature = %prior.signature,
                "dangling reservation reconciled from ledger history"
            );
            Ok(Some(Outcome::Skipped {
                reason: "fulfilled by earlier run, record reconciled".to_string(),
            }))
        }
        Err(RegistryError::AlreadyFulfilled { .. }) => Ok(Some(Outcome::Skipped {
            reason: "already fulfilled".to_string(),
        })),
        Err(e) => Ok(Some(Outcome::Failed {
            kind: "registry".to_string(),
            reason: e.to_string(),
        })),
    }
}

fn try_reserve(pool: &AtomicU64, amount: u64) -> bool {
    pool.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        current.checked_sub(amount)
    })
    .is_ok()
}

fn release(pool: &AtomicU64, amount: u64) {
    pool.fetch_add(amount, Ordering::AcqRel);
}
