//! The registry store.
//!
//! Recipients live in a `BTreeMap` keyed by id, which gives the stable
//! ascending selection order distribution relies on. All mutation happens
//! under one `RwLock`, so the active-mint flip is transactional: readers
//! never observe zero or two active mints.

use crate::error::{RegistryError, Result};
use crate::mint::MintRecord;
use crate::recipient::{Recipient, RecipientId};
use ration_ledger::{Address, Signature};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Inner {
    recipients: BTreeMap<RecipientId, Recipient>,
    mints: Vec<MintRecord>,
}

/// Recipient and mint-pointer store.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a recipient.
    pub async fn upsert(&self, recipient: Recipient) {
        let mut inner = self.inner.write().await;
        inner.recipients.insert(recipient.id.clone(), recipient);
    }

    /// Get a recipient by id.
    pub async fn get(&self, id: &RecipientId) -> Option<Recipient> {
        let inner = self.inner.read().await;
        inner.recipients.get(id).cloned()
    }

    /// Total number of registered recipients.
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.recipients.len()
    }

    /// Whether the registry holds no recipients.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of eligible, unfulfilled recipients in ascending id order.
    ///
    /// This is the selection read distribution takes once at run start.
    pub async fn eligible_unfulfilled(&self) -> Vec<Recipient> {
        let inner = self.inner.read().await;
        inner
            .recipients
            .values()
            .filter(|r| r.is_claimable())
            .cloned()
            .collect()
    }

    /// Count of eligible recipients, fulfilled or not. Supply planning
    /// sizes the mint to this number.
    pub async fn count_eligible(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .recipients
            .values()
            .filter(|r| r.eligibility == crate::recipient::Eligibility::Eligible)
            .count()
    }

    /// Count of fulfilled recipients.
    pub async fn count_fulfilled(&self) -> usize {
        let inner = self.inner.read().await;
        inner.recipients.values().filter(|r| r.fulfilled).count()
    }

    /// Ids of fulfilled recipients, in ascending id order.
    pub async fn fulfilled_ids(&self) -> Vec<RecipientId> {
        let inner = self.inner.read().await;
        inner
            .recipients
            .values()
            .filter(|r| r.fulfilled)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Whether a recipient is fulfilled.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RecipientNotFound`] for an unknown id.
    pub async fn is_fulfilled(&self, id: &RecipientId) -> Result<bool> {
        let inner = self.inner.read().await;
        inner
            .recipients
            .get(id)
            .map(|r| r.fulfilled)
            .ok_or_else(|| RegistryError::RecipientNotFound { id: id.to_string() })
    }

    /// Write a pre-transfer reservation for a recipient.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RecipientNotFound`] for an unknown id and
    /// [`RegistryError::AlreadyFulfilled`] if the recipient was fulfilled
    /// in the meantime.
    pub async fn reserve(
        &self,
        id: &RecipientId,
        run_id: &str,
        receiving_account: Address,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let recipient = inner
            .recipients
            .get_mut(id)
            .ok_or_else(|| RegistryError::RecipientNotFound { id: id.to_string() })?;
        if recipient.fulfilled {
            return Err(RegistryError::AlreadyFulfilled { id: id.to_string() });
        }
        recipient.reserve(run_id, receiving_account);
        debug!(recipient = %id, run = run_id, "reservation written");
        Ok(())
    }

    /// Drop a recipient's reservation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RecipientNotFound`] for an unknown id.
    pub async fn clear_reservation(&self, id: &RecipientId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let recipient = inner
            .recipients
            .get_mut(id)
            .ok_or_else(|| RegistryError::RecipientNotFound { id: id.to_string() })?;
        recipient.clear_reservation();
        Ok(())
    }

    /// Record fulfillment for a recipient.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RecipientNotFound`] for an unknown id and
    /// [`RegistryError::AlreadyFulfilled`] if already fulfilled.
    pub async fn complete_fulfillment(
        &self,
        id: &RecipientId,
        receiving_account: Address,
        signature: Signature,
    ) -> Result<Recipient> {
        let mut inner = self.inner.write().await;
        let recipient = inner
            .recipients
            .get_mut(id)
            .ok_or_else(|| RegistryError::RecipientNotFound { id: id.to_string() })?;
        recipient.mark_fulfilled(receiving_account, signature)?;
        info!(recipient = %id, "fulfillment recorded");
        Ok(recipient.clone())
    }

    /// Register a mint and make it the active one.
    ///
    /// Deactivates every other record and activates this one under a
    /// single write lock, so there is no intermediate state with zero or
    /// two active mints.
    pub async fn activate(&self, mut record: MintRecord) {
        let mut inner = self.inner.write().await;
        for existing in &mut inner.mints {
            existing.active = false;
        }
        record.active = true;
        info!(mint = %record.address, "mint activated");
        inner.mints.push(record);
    }

    /// The currently active mint, if any.
    pub async fn active_mint(&self) -> Option<MintRecord> {
        let inner = self.inner.read().await;
        inner.mints.iter().find(|m| m.active).cloned()
    }

    /// Look up a mint record by address.
    pub async fn mint(&self, address: &Address) -> Option<MintRecord> {
        let inner = self.inner.read().await;
        inner.mints.iter().find(|m| m.address == *address).cloned()
    }

    /// Mark a mint's metadata as attached. Set once, never unset.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MintNotFound`] for an unknown address.
    pub async fn set_metadata_attached(&self, address: &Address) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .mints
            .iter_mut()
            .find(|m| m.address == *address)
            .ok_or_else(|| RegistryError::MintNotFound {
                mint: address.to_string(),
            })?;
        record.metadata_attached = true;
        Ok(())
    }
}
